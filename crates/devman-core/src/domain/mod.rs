//! Domain entities for the input device manager.
//!
//! This module contains pure bookkeeping with no host dependencies.
//!
//! # What is "domain" here? (for beginners)
//!
//! The device manager reacts to a windowing system and a tool context, but
//! the rules about *what* it tracks do not depend on either.  Those rules live
//! here:
//!
//! - How many times each display has been opened ([`display`]).
//! - Which devices have ever been seen, and what tool settings each one keeps
//!   ([`device`], [`directory`]).
//! - How two settings bundles are kept in sync while linked ([`options`]).
//!
//! Code in the `devman` crate wires these to the host, but the domain never
//! depends on it.  Everything here can be unit-tested without a display.

pub mod device;
pub mod directory;
pub mod display;
pub mod event;
pub mod options;
pub mod tool;
