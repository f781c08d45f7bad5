//! Integration tests: the HTTP API, presence, and delivery wired together
//! over the in-memory store.

mod helpers;

mod api_test;
mod delivery_test;
mod presence_test;
