//! Test suites for the WebDAV daemon.

mod support;
mod unit;
