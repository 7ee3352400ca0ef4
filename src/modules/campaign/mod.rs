// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod entity;
pub mod observer;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod service;
