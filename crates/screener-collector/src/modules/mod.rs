//! 일일 갱신 파이프라인 모듈.

pub mod categorize;
pub mod corporate_actions;
pub mod daily_update;
pub mod indicator_refresh;

pub use categorize::{categorize_symbols, CategorizedSymbols};
pub use corporate_actions::{detect_corporate_actions, DetectionOutcome};
pub use daily_update::daily_update;
pub use indicator_refresh::{refresh_indicators, IndicatorRunStats};
