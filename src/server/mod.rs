pub mod http;
pub mod tools;

pub use tools::JsonTranslatorServer;
