use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use compat_config::log_cli_info;
use compat_dirent::{alphasort, scandir, versionsort, Compare, DirEntry, FileType, NameUnit};

#[derive(Args)]
pub struct LsArgs {
    #[arg(value_name = "DIR")]
    pub directory: PathBuf,

    /// Ordering applied after the scan
    #[arg(long, value_enum, default_value_t = SortOrder::Alpha)]
    pub sort: SortOrder,

    /// Read through the wide-character stream
    #[arg(long)]
    pub wide: bool,

    /// Leave out names starting with a dot
    #[arg(long)]
    pub filter_hidden: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Native enumeration order
    #[value(name = "none")]
    Unsorted,
    Alpha,
    Version,
}

struct Row {
    d_type: FileType,
    d_off: i64,
    name: String,
}

fn type_label(d_type: FileType) -> &'static str {
    match d_type {
        FileType::Regular => "reg",
        FileType::Directory => "dir",
        FileType::Symlink => "lnk",
        FileType::CharDevice => "chr",
        FileType::Unknown => "unk",
    }
}

fn scan<C: NameUnit>(args: &LsArgs) -> Result<Vec<Row>> {
    let dot = C::from_os_str(OsStr::new("."));
    let visible = |entry: &DirEntry<C>| entry.name().first() != dot.first();
    let filter: Option<&dyn Fn(&DirEntry<C>) -> bool> = if args.filter_hidden {
        Some(&visible)
    } else {
        None
    };
    let compare: Option<Compare<C>> = match args.sort {
        SortOrder::Unsorted => None,
        SortOrder::Alpha => Some(alphasort::<C>),
        SortOrder::Version => Some(versionsort::<C>),
    };

    let entries = scandir(&args.directory, filter, compare).with_context(|| {
        format!(
            "cannot list {} ({})",
            args.directory.display(),
            compat_errno::str_std_error(compat_errno::get_std_errno())
        )
    })?;

    Ok(entries
        .iter()
        .map(|entry| Row {
            d_type: entry.file_type(),
            d_off: entry.d_off,
            name: entry.name_lossy(),
        })
        .collect())
}

pub fn run(args: &LsArgs) -> Result<()> {
    let rows = if args.wide {
        scan::<u16>(args)?
    } else {
        scan::<u8>(args)?
    };

    for row in &rows {
        println!("{} {:>10} {}", type_label(row.d_type), row.d_off, row.name);
    }
    let name_max = compat_config::config().dirent.name_max;
    println!("total {} (name_max {})", rows.len(), name_max);

    log_cli_info!(
        "Listed directory",
        entries = rows.len(),
        sort = tracing::field::debug(args.sort)
    );
    Ok(())
}
