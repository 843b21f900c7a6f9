use assert_cmd::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const INVENTORY: &str = r#"{
    "servers": [
        {
            "id": "abc",
            "name": "node-1",
            "status": "ACTIVE",
            "OS-EXT-AZ:availability_zone": "AZ_1!!",
            "flavor": {"id": "2"},
            "addresses": {"private": [{"addr": "10.0.0.5", "OS-EXT-IPS:type": "fixed"}]}
        },
        {"id": "xyz", "name": "node-3", "status": "SHUTOFF"},
        {"id": "d1", "name": "node-2", "status": "ACTIVE"},
        {"id": "d2", "name": "node-2", "status": "ACTIVE"}
    ],
    "flavors": [{"id": "2", "name": "m1.small"}],
    "ports": [
        {"id": "p1", "device_id": "abc", "status": "ACTIVE", "fixed_ips": [{"ip_address": "10.0.0.5"}]}
    ]
}"#;

fn inventory() -> color_eyre::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(INVENTORY.as_bytes())?;
    Ok(file)
}

fn bare() -> color_eyre::Result<Command> {
    let mut cmd = Command::cargo_bin("stratus")?;
    cmd.env_remove("OS_CCM_REGIONAL")
        .env_remove("OS_REGION_NAME")
        .env_remove("STRATUS_INVENTORY")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

fn stratus(inventory: &NamedTempFile, args: &[&str]) -> color_eyre::Result<Command> {
    let mut cmd = bare()?;
    cmd.args(args)
        .arg("--inventory")
        .arg(inventory.path())
        .args(["--region", "local"]);
    Ok(cmd)
}

#[test]
fn test_exists_by_name() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = stratus(&inv, &["exists", "--node", "node-1"])?.output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "true");

    let output = stratus(&inv, &["exists", "--node", "node-9"])?.output()?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "false");
    Ok(())
}

#[test]
fn test_metadata_output() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = stratus(&inv, &["metadata", "--node", "node-1"])?.output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let meta: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(meta["providerId"], "openstack:///abc");
    assert_eq!(meta["instanceType"], "m1.small");
    assert_eq!(meta["zone"], "az_1");
    assert_eq!(meta["region"], "local");
    assert_eq!(meta["nodeAddresses"][0]["address"], "10.0.0.5");
    Ok(())
}

#[test]
fn test_metadata_regional_from_env() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = stratus(&inv, &["metadata", "--node", "node-1"])?
        .env("OS_CCM_REGIONAL", "true")
        .output()?;
    assert!(output.status.success());

    let meta: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(meta["providerId"], "openstack://local/abc");
    Ok(())
}

#[test]
fn test_shutdown_by_provider_id() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = stratus(
        &inv,
        &["shutdown", "--node", "node-3", "--provider-id", "openstack://local/xyz"],
    )?
    .output()?;

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "true");
    Ok(())
}

#[test]
fn test_region_mismatch_fails() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = stratus(
        &inv,
        &["metadata", "--node", "node-3", "--provider-id", "openstack://remote/xyz"],
    )?
    .output()?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("region-mismatch"));
    Ok(())
}

#[test]
fn test_duplicate_names_fail() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = stratus(&inv, &["exists", "--node", "node-2"])?.output()?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ambiguous"));
    Ok(())
}

#[test]
fn test_cloud_flags_before_subcommand() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = bare()?
        .args(["--region", "local", "--regional-provider-id", "--inventory"])
        .arg(inv.path())
        .args(["metadata", "--node", "node-1"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let meta: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(meta["providerId"], "openstack://local/abc");
    Ok(())
}

#[test]
fn test_cloud_flags_from_env() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = bare()?
        .env("STRATUS_INVENTORY", inv.path())
        .env("OS_REGION_NAME", "local")
        .args(["exists", "--node", "node-1"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "true");
    Ok(())
}

#[test]
fn test_regional_env_needs_exact_true() -> color_eyre::Result<()> {
    let inv = inventory()?;
    let output = stratus(&inv, &["metadata", "--node", "node-1"])?
        .env("OS_CCM_REGIONAL", "1")
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let meta: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(meta["providerId"], "openstack:///abc");
    Ok(())
}

#[test]
fn test_missing_inventory_fails() -> color_eyre::Result<()> {
    let output = bare()?
        .args(["--region", "local", "exists", "--node", "node-1"])
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--inventory"));
    Ok(())
}

#[test]
fn test_provider_id_and_sanitize() -> color_eyre::Result<()> {
    let output = bare()?
        .args(["--region", "RegionOne", "--regional-provider-id"])
        .args(["provider-id", "encode", "abc"])
        .output()?;
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "openstack://RegionOne/abc"
    );

    let output = bare()?.args(["provider-id", "encode", "abc"]).output()?;
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "openstack:///abc");

    let output = bare()?
        .args(["provider-id", "decode", "openstack:///abc"])
        .output()?;
    let decoded: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(decoded["instanceId"], "abc");
    assert_eq!(decoded["region"], "");

    let output = bare()?.args(["sanitize", "Zone A / Rack 3"]).output()?;
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "zone-a-rack-3");
    Ok(())
}

#[test]
fn test_encode_rejects_undecodable_id() -> color_eyre::Result<()> {
    let output = bare()?.args(["provider-id", "encode", "a/b"]).output()?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed-identity"));
    Ok(())
}
