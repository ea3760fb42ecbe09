//! Project context detection.
//!
//! Scans a directory for marker files and returns a structured snapshot of
//! the detected tech stack. Pure read of the filesystem; absence of markers
//! yields an empty context, and detection itself never fails.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

/// Snapshot of the working directory's detected tech stack and tooling.
///
/// Captured once at interview start and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectContext {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub package_managers: Vec<String>,
    /// Never assigned by detection today; honored by developer-type
    /// derivation when a caller supplies it.
    pub project_type: Option<String>,
    pub has_tests: bool,
    pub has_docker: bool,
    pub has_git: bool,
    pub ide_config: Vec<String>,
    pub linting_tools: Vec<String>,
    pub ci_cd: Vec<String>,
    pub directory_structure: Vec<String>,
    /// Per-ecosystem dependency names, capped at the first 10.
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl ProjectContext {
    /// Human-readable one-liner for the context banner.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.languages.is_empty() {
            parts.push(format!("Languages: {}", self.languages.join(", ")));
        }
        if !self.frameworks.is_empty() {
            parts.push(format!("Frameworks: {}", self.frameworks.join(", ")));
        }
        if !self.package_managers.is_empty() {
            parts.push(format!(
                "Package managers: {}",
                self.package_managers.join(", ")
            ));
        }

        let mut features = Vec::new();
        if self.has_git {
            features.push("Git".to_string());
        }
        if self.has_docker {
            features.push("Docker".to_string());
        }
        if self.has_tests {
            features.push("Tests".to_string());
        }
        if !self.ide_config.is_empty() {
            features.push(format!("IDE: {}", self.ide_config.join(", ")));
        }
        if !self.linting_tools.is_empty() {
            features.push(format!("Linting: {}", self.linting_tools.join(", ")));
        }
        if !features.is_empty() {
            parts.push(format!("Tools: {}", features.join(", ")));
        }

        if parts.is_empty() {
            "No specific project structure detected".to_string()
        } else {
            parts.join("; ")
        }
    }

    /// Whether detection found enough to tailor questions around.
    pub fn has_signals(&self) -> bool {
        !self.languages.is_empty()
            || !self.frameworks.is_empty()
            || self.has_git
            || self.has_docker
            || self.has_tests
    }

    /// JSON rendering used when folding the context into model instructions.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Marker file → (languages, package manager, frameworks).
const LANGUAGE_MARKERS: &[(&str, &[&str], Option<&str>, &[&str])] = &[
    ("package.json", &["JavaScript"], Some("npm"), &[]),
    ("yarn.lock", &[], Some("yarn"), &[]),
    ("tsconfig.json", &["TypeScript"], None, &[]),
    ("requirements.txt", &["Python"], Some("pip"), &[]),
    ("pyproject.toml", &["Python"], Some("pip/poetry"), &[]),
    ("Pipfile", &["Python"], Some("pipenv"), &[]),
    ("setup.py", &["Python"], None, &[]),
    ("poetry.lock", &[], Some("poetry"), &[]),
    ("Cargo.toml", &["Rust"], Some("cargo"), &[]),
    ("go.mod", &["Go"], Some("go modules"), &[]),
    ("pom.xml", &["Java"], Some("maven"), &["Spring"]),
    ("build.gradle", &["Java", "Kotlin"], Some("gradle"), &[]),
    ("composer.json", &["PHP"], Some("composer"), &[]),
    ("Gemfile", &["Ruby"], Some("bundler"), &[]),
];

const IDE_MARKERS: &[(&str, &str)] = &[
    (".vscode", "VS Code"),
    (".idea", "IntelliJ/PyCharm"),
    (".eclipse", "Eclipse"),
    (".sublime-project", "Sublime Text"),
];

const LINT_MARKERS: &[(&str, &str)] = &[
    (".eslintrc", "ESLint"),
    (".eslintrc.js", "ESLint"),
    (".eslintrc.json", "ESLint"),
    (".prettierrc", "Prettier"),
    (".prettierrc.js", "Prettier"),
    (".prettierrc.json", "Prettier"),
    (".flake8", "flake8"),
    ("pyproject.toml", "Black/isort"),
    (".pylintrc", "pylint"),
    (".golangci.yml", "golangci-lint"),
    (".rubocop.yml", "RuboCop"),
];

const CI_MARKERS: &[(&str, &str)] = &[
    (".github/workflows", "GitHub Actions"),
    (".gitlab-ci.yml", "GitLab CI"),
    (".travis.yml", "Travis CI"),
    ("Jenkinsfile", "Jenkins"),
    (".circleci", "CircleCI"),
];

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec"];

const COMMON_DIRS: &[&str] = &[
    "src",
    "lib",
    "app",
    "components",
    "pages",
    "api",
    "public",
    "static",
    "assets",
    "docs",
    "scripts",
    "config",
    "utils",
    "helpers",
    "models",
    "views",
    "controllers",
    "services",
    "middleware",
];

/// package.json dependency → framework name.
const NPM_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue.js"),
    ("@vue/core", "Vue.js"),
    ("angular", "Angular"),
    ("@angular/core", "Angular"),
    ("next", "Next.js"),
    ("nuxt", "Nuxt.js"),
    ("express", "Express.js"),
    ("fastify", "Fastify"),
    ("nest", "NestJS"),
    ("@nestjs/core", "NestJS"),
    ("svelte", "Svelte"),
    ("gatsby", "Gatsby"),
    ("remix", "Remix"),
];

/// requirements.txt package → framework name.
const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("tornado", "Tornado"),
    ("pyramid", "Pyramid"),
    ("bottle", "Bottle"),
    ("cherrypy", "CherryPy"),
    ("sanic", "Sanic"),
];

const DEPENDENCY_LIST_CAP: usize = 10;

/// Analyze a directory for project context.
pub fn detect(root: &Path) -> ProjectContext {
    let mut languages = BTreeSet::new();
    let mut frameworks = BTreeSet::new();
    let mut package_managers = BTreeSet::new();
    let mut ide_config = BTreeSet::new();
    let mut linting_tools = BTreeSet::new();
    let mut ci_cd = BTreeSet::new();

    for (marker, langs, manager, fwks) in LANGUAGE_MARKERS {
        if root.join(marker).exists() {
            languages.extend(langs.iter().map(|s| s.to_string()));
            if let Some(manager) = manager {
                package_managers.insert(manager.to_string());
            }
            frameworks.extend(fwks.iter().map(|s| s.to_string()));
        }
    }

    for (marker, ide) in IDE_MARKERS {
        if root.join(marker).exists() {
            ide_config.insert(ide.to_string());
        }
    }

    for (marker, tool) in LINT_MARKERS {
        if root.join(marker).exists() {
            linting_tools.insert(tool.to_string());
        }
    }

    for (marker, ci) in CI_MARKERS {
        if root.join(marker).exists() {
            ci_cd.insert(ci.to_string());
        }
    }

    let has_git = root.join(".git").exists();
    let has_docker = ["Dockerfile", "docker-compose.yml", "docker-compose.yaml"]
        .iter()
        .any(|f| root.join(f).exists());
    let has_tests = TEST_DIRS.iter().any(|d| root.join(d).is_dir());

    let directory_structure = COMMON_DIRS
        .iter()
        .filter(|d| root.join(d).is_dir())
        .map(|d| d.to_string())
        .collect();

    let mut dependencies = BTreeMap::new();
    parse_package_json(root, &mut frameworks, &mut dependencies);
    parse_requirements(root, &mut frameworks, &mut dependencies);

    let context = ProjectContext {
        languages: languages.into_iter().collect(),
        frameworks: frameworks.into_iter().collect(),
        package_managers: package_managers.into_iter().collect(),
        project_type: None,
        has_tests,
        has_docker,
        has_git,
        ide_config: ide_config.into_iter().collect(),
        linting_tools: linting_tools.into_iter().collect(),
        ci_cd: ci_cd.into_iter().collect(),
        directory_structure,
        dependencies,
    };

    debug!(summary = %context.summary(), "project_context_detected");
    context
}

/// Pull frameworks and a capped dependency list out of package.json.
fn parse_package_json(
    root: &Path,
    frameworks: &mut BTreeSet<String>,
    dependencies: &mut BTreeMap<String, Vec<String>>,
) {
    let Ok(contents) = std::fs::read_to_string(root.join("package.json")) else {
        return;
    };
    let Ok(package) = serde_json::from_str::<serde_json::Value>(&contents) else {
        debug!("package_json_parse_failed");
        return;
    };

    let mut all_deps = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = package.get(section).and_then(|v| v.as_object()) {
            all_deps.extend(deps.keys().cloned());
        }
    }

    for (dep, framework) in NPM_FRAMEWORKS {
        if all_deps.iter().any(|d| d == dep) {
            frameworks.insert(framework.to_string());
        }
    }

    if !all_deps.is_empty() {
        all_deps.truncate(DEPENDENCY_LIST_CAP);
        dependencies.insert("npm".to_string(), all_deps);
    }
}

/// Pull frameworks and a capped dependency list out of requirements.txt.
fn parse_requirements(
    root: &Path,
    frameworks: &mut BTreeSet<String>,
    dependencies: &mut BTreeMap<String, Vec<String>>,
) {
    let Ok(contents) = std::fs::read_to_string(root.join("requirements.txt")) else {
        return;
    };

    let requirements: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            // Keep the bare package name, dropping any version pin.
            line.split(['=', '>', '<', '~'])
                .next()
                .unwrap_or(line)
                .trim()
                .to_string()
        })
        .collect();

    for req in &requirements {
        let lower = req.to_lowercase();
        for (package, framework) in PYTHON_FRAMEWORKS {
            if lower == *package {
                frameworks.insert(framework.to_string());
            }
        }
    }

    if !requirements.is_empty() {
        let mut capped = requirements;
        capped.truncate(DEPENDENCY_LIST_CAP);
        dependencies.insert("python".to_string(), capped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let context = detect(dir.path());

        assert!(context.languages.is_empty());
        assert!(context.frameworks.is_empty());
        assert!(!context.has_git);
        assert!(!context.has_tests);
        assert!(!context.has_signals());
        assert_eq!(context.summary(), "No specific project structure detected");
    }

    #[test]
    fn test_detect_rust_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();

        let context = detect(dir.path());
        assert_eq!(context.languages, vec!["Rust"]);
        assert_eq!(context.package_managers, vec!["cargo"]);
        assert!(context.has_tests);
        assert!(context.directory_structure.contains(&"src".to_string()));
        assert!(context.has_signals());
    }

    #[test]
    fn test_detect_git_and_docker() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();

        let context = detect(dir.path());
        assert!(context.has_git);
        assert!(context.has_docker);
        assert!(context.summary().contains("Git"));
        assert!(context.summary().contains("Docker"));
    }

    #[test]
    fn test_detect_node_project_with_frameworks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{
                "dependencies": {"react": "^18.0.0", "left-pad": "1.0.0"},
                "devDependencies": {"jest": "^29.0.0"}
            }"#,
        )
        .unwrap();
        fs::write(dir.path().join("tsconfig.json"), "{}").unwrap();

        let context = detect(dir.path());
        assert_eq!(context.languages, vec!["JavaScript", "TypeScript"]);
        assert_eq!(context.frameworks, vec!["React"]);
        assert_eq!(context.package_managers, vec!["npm"]);
        let npm_deps = &context.dependencies["npm"];
        assert!(npm_deps.contains(&"react".to_string()));
        assert!(npm_deps.contains(&"jest".to_string()));
    }

    #[test]
    fn test_detect_malformed_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{not json").unwrap();

        // Language detection from the marker still works; parsing is skipped.
        let context = detect(dir.path());
        assert_eq!(context.languages, vec!["JavaScript"]);
        assert!(!context.dependencies.contains_key("npm"));
    }

    #[test]
    fn test_detect_python_frameworks_and_versions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("requirements.txt"),
            "# deps\nflask==2.3.0\nrequests>=2.0\nnumpy~=1.26\n",
        )
        .unwrap();

        let context = detect(dir.path());
        assert_eq!(context.languages, vec!["Python"]);
        assert_eq!(context.frameworks, vec!["Flask"]);
        let python_deps = &context.dependencies["python"];
        assert_eq!(
            python_deps,
            &vec![
                "flask".to_string(),
                "requests".to_string(),
                "numpy".to_string()
            ]
        );
    }

    #[test]
    fn test_dependency_list_capped_at_ten() {
        let dir = tempfile::tempdir().unwrap();
        let reqs: String = (0..15).map(|i| format!("package{}\n", i)).collect();
        fs::write(dir.path().join("requirements.txt"), reqs).unwrap();

        let context = detect(dir.path());
        assert_eq!(context.dependencies["python"].len(), 10);
    }

    #[test]
    fn test_detect_ci_and_linting() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".github/workflows")).unwrap();
        fs::write(dir.path().join(".eslintrc.json"), "{}").unwrap();

        let context = detect(dir.path());
        assert_eq!(context.ci_cd, vec!["GitHub Actions"]);
        assert_eq!(context.linting_tools, vec!["ESLint"]);
    }

    #[test]
    fn test_summary_lists_languages_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example\n").unwrap();

        let context = detect(dir.path());
        let summary = context.summary();
        assert!(summary.starts_with("Languages: Go"));
        assert!(summary.contains("go modules"));
    }
}
