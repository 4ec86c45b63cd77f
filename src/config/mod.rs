pub mod params;
pub mod schema;
pub mod selectors;

pub use params::{ParamDef, Params};
pub use schema::{
    BrowserConfig, ClickConfig, Config, ExtractionConfig, LocationConfig, NavigationConfig,
    OnFailure, RetryConfig, TargetUrl, Timeouts, Viewport,
};
pub use selectors::SiteSelectors;
