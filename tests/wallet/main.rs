
mod admin_test;
