
mod ask_test;
mod builder_test;
mod config_test;
mod executor_test;
mod format_test;
mod masking_test;
mod secrets_test;
