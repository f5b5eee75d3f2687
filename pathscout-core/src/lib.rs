pub mod crawl;
pub mod report;

pub use crawl::{CrawlOptions, execute_crawl};
pub use report::{DisplayMode, render_all_json, render_all_text, render_json, render_text};
