mod common;
mod flows;
mod properties;
mod scenarios;
