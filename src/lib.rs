pub mod config;
pub mod convert;
pub mod database_ops;
pub mod geojson_src;
pub mod logging;

pub mod util {
    pub mod env;
}
