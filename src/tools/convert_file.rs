use crate::config::Config;
use crate::request::convert_request;
use crate::tools::{execute, rejected};
use serde_json::Value;

pub fn call(args: &Value, config: &Config) -> Value {
    match convert_request(args) {
        Ok(request) => execute(&request, config, "converted"),
        Err(err) => rejected(&err),
    }
}
