pub mod embedded;
pub mod floor_area;
pub mod http;
pub mod normalize;
pub mod ocr;
pub mod pagination;
pub mod rightmove;
pub mod traits;
pub mod types;

pub use http::HttpFetcher;
pub use ocr::TesseractOcr;
pub use rightmove::RightmoveSpider;
pub use traits::ScraperTrait;

/// Names of the spiders the CLI can run
pub const SPIDERS: &[&str] = &["rightmove"];
