// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod campaign;
pub mod common;
pub mod composer;
pub mod contacts;
pub mod context;
pub mod credentials;
pub mod delivery;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod oauth2;
pub mod quota;
pub mod rest;
pub mod scheduler;
pub mod settings;
pub mod tasks;
pub mod utils;
