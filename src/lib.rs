//! # zip-core: the engine behind an Info-ZIP-compatible `zip`/`unzip`/`zipinfo` toolkit
//!
//! `zip-core` owns the on-disk binary format, the archive-update planner,
//! streaming compression, and the safe rewrite protocol. It does not parse
//! argv or print progress to a terminal; a thin CLI binary builds a
//! [`config::Config`] from flags and drives [`planner`], [`writer`], and
//! [`reader`] directly.
//!
//! ## Quick start
//!
//! ### Writing an archive
//!
//! ```no_run
//! use zip_core::config::{Config, Session};
//! use zip_core::entry::{Action, Entry, Method, Origin};
//! use zip_core::dostime::DosDateTime;
//! use zip_core::writer::write_archive;
//! use std::path::Path;
//!
//! let mut entries = vec![Entry {
//!     name: "hello.txt".to_string(),
//!     method: Method::Deflate,
//!     flags: 0,
//!     crc32: 0,
//!     comp_size: 0,
//!     uncomp_size: 0,
//!     mtime_dos: DosDateTime { time: 0, date: 0x21 },
//!     external_attrs: 0,
//!     extra: Vec::new(),
//!     comment: Vec::new(),
//!     lho_offset: 0,
//!     origin: Origin::FromMemory(b"hello, world".to_vec()),
//!     action: Action::Add,
//! }];
//! let config = Config::default();
//! let mut session = Session::new();
//! write_archive(Path::new("out.zip"), None, &mut entries, &[], &config, &mut session)?;
//! # Ok::<(), zip_core::error::Error>(())
//! ```
//!
//! ### Reading an archive
//!
//! ```no_run
//! use zip_core::reader::Reader;
//!
//! let mut reader = Reader::open("out.zip")?;
//! for entry in &reader.entries {
//!     println!("{}: {} bytes", entry.name, entry.uncomp_size);
//! }
//! let data = reader.read_entry(&reader.entries[0].clone())?;
//! # Ok::<(), zip_core::error::Error>(())
//! ```

pub mod archive;
pub mod codec;
pub mod config;
pub mod crc;
pub mod dostime;
pub mod entry;
pub mod error;
pub mod fs_candidates;
pub mod glob;
pub mod inspector;
pub mod io_buf;
pub mod planner;
pub mod reader;
pub mod records;
pub mod writer;

pub use archive::Archive;
pub use config::{Config, Session};
pub use entry::{Entry, Method, Origin};
pub use error::{Error, Result};
pub use planner::{plan, Mode, PlannerOptions};
pub use reader::Reader;
pub use writer::write_archive;
