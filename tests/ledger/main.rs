mod entry_test;
mod query_test;
