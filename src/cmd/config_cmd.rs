//! Configuration introspection command.
//!
//! Provides `threads config` subcommands:
//! - show: Display resolved configuration
//! - env: List environment variables
//! - init: Create template manifest

use std::fs;

use clap::{Args, Subcommand};

use threads::config::{CONFIG_DIR, ENV_VARS, MANIFEST_FILE, template_manifest, user_config_path};
use threads::{Error, Result};

use super::Context;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show resolved configuration
    Show {
        /// List the sources that contributed
        #[arg(long)]
        effective: bool,
    },

    /// List environment variables
    Env,

    /// Create template manifest file
    Init {
        /// Directory to create manifest in (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Overwrite existing manifest
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show { effective } => {
            if effective {
                println!("# Resolved configuration");
                println!("# Sources (in order of application):");
                for source in &ctx.sources {
                    println!("#   - {}", source);
                }
                println!("# Root: {}", ctx.root.display());
                println!();
            }
            print!("{}", serde_yaml::to_string(&ctx.config)?);
            Ok(())
        }
        ConfigCommand::Env => {
            println!("Environment Variables:");
            println!();
            for var in ENV_VARS {
                println!("  {}", var.name);
                println!("    {}", var.description);
                println!("    Default: {}", var.default);
                println!("    Config path: {}", var.config_path);
                println!();
            }
            Ok(())
        }
        ConfigCommand::Init { path, force } => run_init(ctx, &path, force),
    }
}

fn run_init(ctx: &Context, path: &str, force: bool) -> Result<()> {
    let target_dir = if path == "." {
        ctx.cwd.clone()
    } else {
        ctx.cwd.join(path)
    };
    let config_dir = target_dir.join(CONFIG_DIR);
    let manifest_path = config_dir.join(MANIFEST_FILE);

    if manifest_path.exists() && !force {
        return Err(Error::Usage(format!(
            "manifest already exists: {}\nUse --force to overwrite",
            manifest_path.display()
        )));
    }

    fs::create_dir_all(&config_dir)
        .map_err(|e| Error::io(format!("creating {}", config_dir.display()), e))?;
    fs::write(&manifest_path, template_manifest())
        .map_err(|e| Error::io(format!("writing {}", manifest_path.display()), e))?;
    println!("Created: {}", manifest_path.display());

    if let Some(user_path) = user_config_path()
        && !user_path.exists()
    {
        println!(
            "Hint: User global config can be placed at: {}",
            user_path.display()
        );
    }
    Ok(())
}
