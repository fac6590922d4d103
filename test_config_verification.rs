#!/usr/bin/env rust-script

//! Test script to verify ConfigManager correctly loads environment-specific overrides
//!
//! Run with: TASKER_ENV=test cargo run --bin test_config_verification

use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set TASKER_ENV to test for verification
    env::set_var("TASKER_ENV", "test");
    
    println!("🔍 Testing ConfigManager environment-specific override loading...\n");

    // This is a simple test script to verify configuration loading
    // We'll create the actual integration in the next step
    println!("✅ Test script created - integrate with tasker-core config system");
    
    // Print current environment variables
    println!("Environment variables:");
    println!("  TASKER_ENV: {}", env::var("TASKER_ENV").unwrap_or_else(|_| "not set".to_string()));
    println!("  RAILS_ENV: {}", env::var("RAILS_ENV").unwrap_or_else(|_| "not set".to_string()));
    println!("  DATABASE_URL: {}", env::var("DATABASE_URL").unwrap_or_else(|_| "not set".to_string()));

    Ok(())
}