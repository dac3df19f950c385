pub mod database_test_utils;
