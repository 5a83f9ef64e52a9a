//! Command-line interface

mod config;
#[path = "main.rs"]
mod main_impl;

pub use main_impl::{
    build_cart, main, BucketArgs, CheckoutArgs, Cli, CliOutputFormat, Command, OrderEntry,
    RemoveBgArgs, UploadArgs,
};
