//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `userlist_core` linkage without the Flutter/FFI runtime.
//! - Run one create/delete cycle against an in-memory store.

use std::process::ExitCode;
use userlist_core::{open_store, StoreConfig, UserDraft, UserListScreen};

fn main() -> ExitCode {
    println!("userlist_core ping={}", userlist_core::ping());
    println!("userlist_core version={}", userlist_core::core_version());

    match run_smoke() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("userlist smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&StoreConfig::in_memory())?;
    let screen = UserListScreen::mount(store);
    println!("users after mount={}", screen.state().users().len());

    screen.begin_create();
    screen.set_draft(UserDraft {
        name: "Bob".to_string(),
        email: "bob@x.com".to_string(),
        age: "25".to_string(),
    })?;
    let created = screen.create()?;
    println!("users after create={}", screen.state().users().len());

    screen.delete(&created)?;
    println!("users after delete={}", screen.state().users().len());

    screen.unmount();
    Ok(())
}
