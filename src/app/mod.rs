//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the authority arbitration rules of the lamp:
//! manual input, routines, sunrise alarms, hardware override, and the
//! suppression windows that arbitrate between them. All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
