//! CLI command implementations

mod ask;
mod crawl;

pub use ask::{cmd_ask, print_ask_report, AskOptions, AskReport};
pub use crawl::{cmd_crawl, print_crawl_report, CrawlOptions, CrawlReport};
