//! # msprof - Ascend Profiling Command-Line Front End
//!
//! msprof validates a profiling request, picks a running mode, then either
//! launches (or attaches to) an AI application, samples whole devices and
//! the host for a period, or drives the Python analysis backend over data
//! collected earlier.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        msprof (CLI)                             │
//! │   clap Args ──▶ ParamValidator ──▶ ProfileParams (+ used set)   │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ RunningMode::select / check / run
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Running Modes                            │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │     App      │   │    System    │   │   Offline    │         │
//! │  │ launch/attach│   │ per-device   │   │ parse/query/ │         │
//! │  │  + dynamic   │   │ host+device  │   │ export/      │         │
//! │  │   client     │   │    tasks     │   │ analyze      │         │
//! │  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘         │
//! │         │                  │                  │                 │
//! │         ▼                  ▼                  ▼                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │ DynProf      │   │    Task      │   │  Analysis    │         │
//! │  │ socket client│   │  Supervisor  │   │  backend     │         │
//! │  └──────────────┘   └──────────────┘   │ (python3)    │         │
//! │                                        └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//!                         │ output.record / PROF_* directories
//!                         ▼
//!                  result directory on disk
//! ```
//!
//! ## Module Structure
//!
//! ### Front end
//!
//! - [`cli`]: Command-line definition (every option is a string until validated)
//! - [`validation`]: Per-option checks producing [`params::ProfileParams`]
//! - [`platform`]: Capability table for the accelerator generation
//!
//! ### Orchestration
//!
//! - [`running_mode`]: Mode selection, per-mode option sets, the mode runs
//! - [`launcher`]: The single supervised child process (app or backend)
//! - [`dynamic`]: Interactive start/stop over a local socket
//! - [`task`]: Collection jobs, samplers and their supervisor
//! - [`driver`]: Seam to the accelerator driver
//!
//! ### Results
//!
//! - [`layout`]: Result directory and job naming
//! - [`record`]: The `output.record` handoff between collectors and msprof
//! - [`backend`]: Command lines of the analysis backend
//!
//! ## Typical Usage
//!
//! ```bash
//! # Launch and profile an application, then export automatically
//! msprof --output=/tmp/prof ./infer --batch 8
//!
//! # Sample device 0 and the host for 10 seconds
//! msprof --sys-devices=0 --sys-period=10 --sys-cpu-profiling=on --output=/tmp/prof
//!
//! # Export previously collected data
//! msprof --export=on --output=/tmp/prof/PROF_000001_20240101000000000_ABCDEFGH
//! ```
//!
//! ## Key Concepts
//!
//! - **Parameter blob**: JSON form of the validated parameters handed to the
//!   application and every collection job
//! - **Used set**: the options actually given, checked against each mode's
//!   black, white and necessary sets
//! - **NotSupport**: a device or platform that cannot collect; exit code 3

pub mod backend;
pub mod cancel;
pub mod cli;
pub mod domain;
pub mod driver;
pub mod dynamic;
pub mod launcher;
pub mod layout;
pub mod params;
pub mod platform;
pub mod preflight;
pub mod process_lookup;
pub mod record;
pub mod running_mode;
pub mod task;
pub mod validation;
