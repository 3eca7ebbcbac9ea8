pub mod request_router;
