//! Integration tests: full tracker rounds against an in-process fake
//! points API and chat webhook.

mod fake_services;
mod tracker_round;
