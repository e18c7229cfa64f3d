//! Info command implementation.

use dkernel_core::{Kernel, KernelConfig};

use crate::colors;

/// Print the kernel banner and language information.
pub fn execute(config: KernelConfig, json: bool) -> anyhow::Result<()> {
    let kernel = Kernel::new(config)?;
    let info = kernel.info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    print!("{}", info.banner);
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Implementation:{} {} {}",
        colors::CYAN,
        colors::RESET,
        info.implementation,
        info.implementation_version
    );
    println!(
        "{}  ◆ Compiler:{} {}",
        colors::CYAN,
        colors::RESET,
        kernel.toolchain().compiler_path().display()
    );
    println!(
        "{}  ◆ Language:{} {} {} ({}, {})",
        colors::CYAN,
        colors::RESET,
        info.language_info.name,
        info.language_info.version,
        info.language_info.file_extension,
        info.language_info.mimetype
    );

    Ok(())
}
