pub mod review_store;
