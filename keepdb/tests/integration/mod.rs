mod fresh_run_test;
mod keep_run_test;
