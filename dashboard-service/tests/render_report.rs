use std::{io::Write, process::Command};

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn stdout_carries_only_the_page_while_logs_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(
        &dir,
        "pannes.csv",
        "id,date,poste,status,tension\n\
         1,2025-03-10 08:00:00,Douala,panne,198.5\n\
         2,2025-03-10 09:00:00,Edea,normal,221\n",
    );
    let config = write_file(
        &dir,
        "dashboard-config.toml",
        &format!(
            "[source]\nkind = \"csv_file\"\n\n[source.csv_file]\npath = {:?}\n",
            csv.display().to_string()
        ),
    );

    let output = Command::new(env!("CARGO_BIN_EXE_render_report"))
        .env("DASHBOARD_CONFIG", &config)
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("<!DOCTYPE html>"), "stdout began with {:?}", &stdout[..stdout.len().min(80)]);
    assert!(!stdout.contains("snapshot loaded"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("snapshot loaded"));
}
