use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "spring_scout_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn seed_project(root: &Path) -> anyhow::Result<()> {
    write_file(
        &root.join("src/main/java/com/example/web/UserController.java"),
        r#"package com.example.web;

import com.example.svc.UserService;

@RestController
public class UserController {
    @Autowired
    private UserService userService;

    public User getUser(Long id) {
        if (id == null) {
            throw new IllegalArgumentException("user.not.found");
        }
        return userService.findById(id);
    }
}
"#,
    )?;
    write_file(
        &root.join("src/main/java/com/example/svc/UserService.java"),
        r#"package com.example.svc;

import com.example.repo.UserRepository;

@Service
public class UserService {
    @Autowired
    private UserRepository userRepository;

    public User findById(Long id) {
        return userRepository.findById(id);
    }
}
"#,
    )?;
    write_file(
        &root.join("src/main/java/com/example/repo/UserRepository.java"),
        r#"package com.example.repo;

@Repository
public class UserRepository {
    public User findById(Long id) {
        return null;
    }
}
"#,
    )?;
    write_file(
        &root.join("src/main/java/com/example/Broken.java"),
        "package com.example;\n\npublic class Broken {\n    public void oops( {\n}\n",
    )?;
    write_file(
        &root.join("src/main/resources/application.yml"),
        "server:\n  port: 8080\n",
    )?;
    Ok(())
}

fn run_json(args: &[&str]) -> anyhow::Result<Value> {
    let out = Command::new(env!("CARGO_BIN_EXE_spring-scout"))
        .args(args)
        .output()?;
    if !out.status.success() {
        return Err(anyhow::anyhow!(
            "command failed: status={:?}, stderr={}",
            out.status.code(),
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(serde_json::from_slice(&out.stdout)?)
}

#[test]
fn full_analysis_flow_works() -> anyhow::Result<()> {
    let base = temp_dir("flow");
    seed_project(&base)?;
    let project = base.to_string_lossy().into_owned();

    let scan = run_json(&["--project", &project, "scan"])?;
    assert_eq!(scan["scanned_files"], Value::from(5));
    assert_eq!(scan["component_count"], Value::from(3));
    assert_eq!(scan["method_count"], Value::from(3));
    assert_eq!(scan["parse_error_count"], Value::from(1));
    assert_eq!(scan["cache_hit"], Value::Bool(false));

    let rescan = run_json(&["--project", &project, "scan"])?;
    assert_eq!(rescan["cache_hit"], Value::Bool(true));
    assert_eq!(rescan["component_count"], Value::from(3));

    let controllers = run_json(&["--project", &project, "components", "--role", "controller"])?;
    let rows = controllers.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0]["fqn"],
        Value::String("com.example.web.UserController".to_string())
    );
    assert_eq!(rows[0]["role"], Value::String("controller".to_string()));

    let found = run_json(&["--project", &project, "find", "UserService"])?;
    assert_eq!(
        found[0]["fqn"],
        Value::String("com.example.svc.UserService".to_string())
    );
    assert_eq!(found[0]["supertypes"], Value::Array(vec![]));

    let methods = run_json(&["--project", &project, "methods", "findById"])?;
    let keys: Vec<&str> = methods
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["key"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec![
            "com.example.repo.UserRepository.findById(Long)",
            "com.example.svc.UserService.findById(Long)",
        ]
    );

    let report = run_json(&[
        "--project",
        &project,
        "analyze",
        "com.example.web.UserController.getUser(Long)",
        "--depth",
        "2",
    ])?;
    assert_eq!(report["role"], Value::String("controller".to_string()));
    assert_eq!(report["external"], Value::Bool(false));
    assert!(
        report["snippet"]
            .as_str()
            .unwrap()
            .contains("userService.findById(id)")
    );
    let outgoing = report["outgoing"].as_array().unwrap();
    let hops: Vec<(&str, u64)> = outgoing
        .iter()
        .map(|e| (e["method_key"].as_str().unwrap(), e["depth"].as_u64().unwrap()))
        .collect();
    assert!(hops.contains(&("com.example.svc.UserService.findById(Long)", 1)));
    assert!(hops.contains(&("com.example.repo.UserRepository.findById(Long)", 2)));
    assert!(report["incoming"].as_array().unwrap().is_empty());

    let hits = run_json(&["--project", &project, "search", "user.not.found"])?;
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0]["fqn"],
        Value::String("com.example.web.UserController".to_string())
    );
    assert!(hits[0]["preview"].as_str().unwrap().contains("user.not.found"));

    let errors = run_json(&["--project", &project, "errors"])?;
    let errors = errors.as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["path"].as_str().unwrap().ends_with("Broken.java"));

    let stats = run_json(&["--project", &project, "stats"])?;
    assert_eq!(stats["components"], Value::from(3));
    assert_eq!(stats["roles"]["controller"], Value::from(1));
    assert_eq!(stats["roles"]["service"], Value::from(1));
    assert_eq!(stats["roles"]["repository"], Value::from(1));
    assert_eq!(stats["parse_errors"], Value::from(1));

    let _ = std::fs::remove_dir_all(base);
    Ok(())
}

#[test]
fn cache_invalidates_after_edits_and_clears_on_demand() -> anyhow::Result<()> {
    let base = temp_dir("cache");
    seed_project(&base)?;
    let project = base.to_string_lossy().into_owned();

    let first = run_json(&["--project", &project, "scan"])?;
    assert_eq!(first["cache_hit"], Value::Bool(false));
    assert!(base.join(".scout-cache/analysis.json").exists());

    // A source edit changes the fingerprint and forces a rebuild.
    write_file(
        &base.join("src/main/java/com/example/repo/UserRepository.java"),
        r#"package com.example.repo;

@Repository
public class UserRepository {
    public User findById(Long id) {
        return null;
    }

    public void deleteById(Long id) {
    }
}
"#,
    )?;
    let after_edit = run_json(&["--project", &project, "scan"])?;
    assert_eq!(after_edit["cache_hit"], Value::Bool(false));
    assert_eq!(after_edit["method_count"], Value::from(4));

    let cleared = run_json(&["--project", &project, "clear-cache"])?;
    assert!(cleared["cleared"].as_str().unwrap().ends_with(".scout-cache"));
    assert!(!base.join(".scout-cache").exists());

    let rebuilt = run_json(&["--project", &project, "scan"])?;
    assert_eq!(rebuilt["cache_hit"], Value::Bool(false));

    let _ = std::fs::remove_dir_all(base);
    Ok(())
}

#[test]
fn no_cache_flag_skips_the_cache_entirely() -> anyhow::Result<()> {
    let base = temp_dir("nocache");
    seed_project(&base)?;
    let project = base.to_string_lossy().into_owned();

    let scan = run_json(&["--project", &project, "--no-cache", "scan"])?;
    assert_eq!(scan["cache_hit"], Value::Bool(false));
    assert!(!base.join(".scout-cache").exists());

    let again = run_json(&["--project", &project, "--no-cache", "scan"])?;
    assert_eq!(again["cache_hit"], Value::Bool(false));

    let _ = std::fs::remove_dir_all(base);
    Ok(())
}
