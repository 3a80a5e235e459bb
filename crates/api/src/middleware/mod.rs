pub mod trigger_token;
