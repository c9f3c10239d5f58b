pub mod id;
pub mod snowflake;

pub use snowflake::SnowflakeGenerator;
