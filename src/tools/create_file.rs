use crate::config::Config;
use crate::request::create_request;
use crate::tools::{execute, rejected};
use serde_json::Value;

pub fn call(args: &Value, config: &Config) -> Value {
    match create_request(args) {
        Ok(request) => execute(&request, config, "created"),
        Err(err) => rejected(&err),
    }
}
