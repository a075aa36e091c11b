use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use tracing::{debug, info};
use uplink_remote::{DryRunRemote, FtpConfig, FtpRemote, MountRemote, RemoteFs};
use uplink_sync::ignore::default_ignore_path;
use uplink_sync::{run_session, IgnoreRules, SyncConfig, SyncReport};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Sync(args) => cmd_sync(args, cli.format).await,
    }
}

async fn cmd_sync(args: SyncArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = SyncConfig::new(&args.project_dir, &args.local_dir, args.remote_dir.as_str())
        .with_state_file(args.state_file.as_str());
    config.validate().context("invalid sync configuration")?;

    let ignore_path = args
        .ignore_file
        .clone()
        .unwrap_or_else(|| default_ignore_path(&args.project_dir));
    let rules = IgnoreRules::load(&ignore_path)
        .with_context(|| format!("failed to load ignore rules from {}", ignore_path.display()))?;
    if rules.local().is_empty() && rules.remote().is_empty() {
        debug!(path = %ignore_path.display(), "no ignore rules");
    } else {
        info!(
            path = %ignore_path.display(),
            local = ?rules.local().patterns(),
            remote = ?rules.remote().patterns(),
            "loaded ignore rules"
        );
    }
    let filters = rules.filters(&args.project_dir);

    let mut remote = open_remote(&args).await?;
    let report = run_session(&mut remote, &config, &filters).await?;
    print_report(&report, format, args.dry_run)
}

async fn open_remote(args: &SyncArgs) -> anyhow::Result<Box<dyn RemoteFs>> {
    let backend: Box<dyn RemoteFs> = match args.transport {
        Transport::Ftp => {
            let host = args
                .host
                .clone()
                .context("--host (or FTP_HOST) is required for the ftp transport")?;
            let ftp = FtpConfig::new(host, args.username.as_str(), args.password.as_str())
                .with_port(args.port)
                .with_connect_timeout(Duration::from_secs(args.connect_timeout));
            info!(host = %ftp.host, port = ftp.port, user = %ftp.username, "connecting");
            let remote = FtpRemote::connect(&ftp)
                .await
                .with_context(|| format!("failed to connect to {}:{}", ftp.host, ftp.port))?;
            Box::new(remote)
        }
        Transport::Mount => {
            let root = args
                .mount_root
                .clone()
                .context("--mount-root is required for the mount transport")?;
            anyhow::ensure!(root.is_dir(), "mount root {} is not a directory", root.display());
            Box::new(MountRemote::new(root))
        }
    };
    Ok(if args.dry_run {
        Box::new(DryRunRemote::new(backend))
    } else {
        backend
    })
}

fn print_report(report: &SyncReport, format: OutputFormat, dry_run: bool) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let mode = if dry_run { " (dry run)".yellow().to_string() } else { String::new() };
    if report.is_noop() {
        println!("{} Remote is up to date{}", "✓".green().bold(), mode);
    } else {
        println!("{} Sync complete{}", "✓".green().bold(), mode);
    }
    println!(
        "  Uploaded: {} files ({} bytes)",
        report.uploaded.to_string().bold(),
        report.bytes_uploaded
    );
    println!("  Unchanged: {}", report.skipped.to_string().dimmed());
    println!(
        "  Deleted: {} files, {} directories",
        report.files_deleted.to_string().red(),
        report.dirs_deleted.to_string().red()
    );
    println!("  Created: {} directories", report.dirs_created.to_string().cyan());
    println!(
        "  Fingerprints: {} ({} dropped)",
        report.fingerprints,
        report.fingerprints_dropped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    fn sync_cli(project: &std::path::Path, mount: &std::path::Path, extra: &[&str]) -> Cli {
        let mut argv = vec![
            "uplink".to_string(),
            "sync".into(),
            "--project-dir".into(),
            project.display().to_string(),
            "--local-dir".into(),
            "public".into(),
            "--remote-dir".into(),
            "www".into(),
            "--transport".into(),
            "mount".into(),
            "--mount-root".into(),
            mount.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn sync_over_mount_transport() {
        let project = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("public/css")).unwrap();
        fs::write(project.path().join("public/index.html"), "<h1>hi</h1>").unwrap();
        fs::write(project.path().join("public/css/site.css"), "h1 {}").unwrap();

        run_command(sync_cli(project.path(), mount.path(), &[])).await.unwrap();

        let www = mount.path().join("www");
        assert_eq!(fs::read_to_string(www.join("index.html")).unwrap(), "<h1>hi</h1>");
        assert_eq!(fs::read_to_string(www.join("css/site.css")).unwrap(), "h1 {}");
        let state = fs::read_to_string(www.join(".hashes")).unwrap();
        assert!(state.contains("public/css/site.css"));
    }

    #[tokio::test]
    async fn dry_run_leaves_mount_untouched() {
        let project = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("public")).unwrap();
        fs::write(project.path().join("public/index.html"), "x").unwrap();

        run_command(sync_cli(project.path(), mount.path(), &["--dry-run"])).await.unwrap();

        assert!(!mount.path().join("www").exists());
    }

    #[tokio::test]
    async fn ignore_file_is_honored() {
        let project = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("public")).unwrap();
        fs::write(project.path().join("public/index.html"), "x").unwrap();
        fs::write(project.path().join("public/notes.md"), "private").unwrap();
        fs::write(
            project.path().join(".ftpignore.json"),
            r#"{"local": ["public/*.md"]}"#,
        )
        .unwrap();

        run_command(sync_cli(project.path(), mount.path(), &[])).await.unwrap();

        assert!(mount.path().join("www/index.html").exists());
        assert!(!mount.path().join("www/notes.md").exists());
    }

    #[tokio::test]
    async fn missing_mount_root_is_an_error() {
        let project = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("public")).unwrap();
        let gone = project.path().join("no-such-mount");

        let err = run_command(sync_cli(project.path(), &gone, &[])).await.unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[tokio::test]
    async fn ftp_without_host_is_an_error() {
        let project = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("public")).unwrap();
        let cli = Cli::try_parse_from([
            "uplink",
            "sync",
            "--project-dir",
            &project.path().display().to_string(),
            "--local-dir",
            "public",
            "--remote-dir",
            "www",
        ])
        .unwrap();
        if std::env::var_os("FTP_HOST").is_some() {
            return;
        }
        let err = run_command(cli).await.unwrap_err();
        assert!(err.to_string().contains("--host"));
    }
}
