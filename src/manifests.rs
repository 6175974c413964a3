//! Dependency manifests at the snapshot root: dependency lists plus
//! framework/database signatures.

use serde_json::Value;
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use crate::text::{read_file_safe, truncate_chars};

/// Longest dependency list kept per ecosystem.
pub const MAX_DEPENDENCIES: usize = 30;

/// Names accepted as the repository README, in order of preference.
pub const README_CANDIDATES: &[&str] = &["README.md", "README.rst", "README.txt", "readme.md"];

const MAX_MANIFEST_BYTES: usize = 1_048_576;
const KEY_FILE_CHARS: usize = 6000;

type Signatures = &'static [(&'static str, &'static str)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchOn {
    /// Signature keys are searched in the lowercased manifest text.
    Content,
    /// Signature keys are searched in each lowercased dependency name.
    Dependencies,
}

struct ManifestKind {
    file: &'static str,
    ecosystem: &'static str,
    extract: fn(&str) -> Result<Vec<String>, String>,
    match_on: MatchOn,
    frameworks: Signatures,
    databases: Signatures,
}

const PYTHON_FRAMEWORKS: Signatures = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("tornado", "Tornado"),
    ("aiohttp", "aiohttp"),
    ("starlette", "Starlette"),
    ("celery", "Celery"),
    ("sqlalchemy", "SQLAlchemy"),
    ("alembic", "Alembic"),
    ("pytest", "pytest"),
    ("numpy", "NumPy"),
    ("pandas", "Pandas"),
    ("tensorflow", "TensorFlow"),
    ("torch", "PyTorch"),
    ("sklearn", "scikit-learn"),
    ("scikit-learn", "scikit-learn"),
    ("transformers", "HuggingFace Transformers"),
    ("langchain", "LangChain"),
    ("pydantic", "Pydantic"),
    ("uvicorn", "Uvicorn"),
];

const PYTHON_DATABASES: Signatures = &[
    ("psycopg2", "PostgreSQL"),
    ("asyncpg", "PostgreSQL"),
    ("pymysql", "MySQL"),
    ("pymongo", "MongoDB"),
    ("redis", "Redis"),
    ("elasticsearch", "Elasticsearch"),
    ("cassandra", "Cassandra"),
    ("sqlite", "SQLite"),
];

const JS_FRAMEWORKS: Signatures = &[
    ("react", "React"),
    ("vue", "Vue.js"),
    ("angular", "Angular"),
    ("next", "Next.js"),
    ("nuxt", "Nuxt.js"),
    ("svelte", "Svelte"),
    ("express", "Express.js"),
    ("fastify", "Fastify"),
    ("koa", "Koa"),
    ("nest", "NestJS"),
    ("gatsby", "Gatsby"),
    ("remix", "Remix"),
    ("vite", "Vite"),
    ("webpack", "Webpack"),
    ("electron", "Electron"),
    ("tailwindcss", "TailwindCSS"),
    ("axios", "Axios"),
    ("redux", "Redux"),
    ("zustand", "Zustand"),
    ("graphql", "GraphQL"),
];

const JS_DATABASES: Signatures = &[
    ("mongoose", "MongoDB"),
    ("pg", "PostgreSQL"),
    ("mysql2", "MySQL"),
    ("redis", "Redis"),
    ("sequelize", "Sequelize"),
    ("prisma", "Prisma"),
    ("typeorm", "TypeORM"),
];

const JAVA_FRAMEWORKS: Signatures = &[
    ("spring-boot", "Spring Boot"),
    ("springframework", "Spring Boot"),
    ("hibernate", "Hibernate"),
    ("junit", "JUnit"),
];

const JAVA_DATABASES: Signatures = &[
    ("postgresql", "PostgreSQL"),
    ("mysql-connector", "MySQL"),
    ("mongodb", "MongoDB"),
    ("jedis", "Redis"),
];

const GO_FRAMEWORKS: Signatures = &[
    ("gin-gonic", "Gin"),
    ("labstack/echo", "Echo"),
    ("gofiber/fiber", "Fiber"),
];

const GO_DATABASES: Signatures = &[
    ("gorm.io", "GORM"),
    ("lib/pq", "PostgreSQL"),
    ("jackc/pgx", "PostgreSQL"),
    ("go-redis", "Redis"),
    ("mongo-driver", "MongoDB"),
];

const RUST_FRAMEWORKS: Signatures = &[
    ("actix", "Actix-web"),
    ("axum", "Axum"),
    ("rocket", "Rocket"),
];

const RUST_DATABASES: Signatures = &[
    ("sqlx", "SQLx"),
    ("diesel", "Diesel"),
    ("tokio-postgres", "PostgreSQL"),
    ("rusqlite", "SQLite"),
    ("redis", "Redis"),
];

const RUBY_FRAMEWORKS: Signatures = &[("rails", "Ruby on Rails"), ("sinatra", "Sinatra")];

const RUBY_DATABASES: Signatures = &[
    ("pg", "PostgreSQL"),
    ("mysql2", "MySQL"),
    ("redis", "Redis"),
    ("mongoid", "MongoDB"),
    ("sqlite3", "SQLite"),
];

const MANIFESTS: &[ManifestKind] = &[
    ManifestKind {
        file: "requirements.txt",
        ecosystem: "python",
        extract: extract_requirements,
        match_on: MatchOn::Content,
        frameworks: PYTHON_FRAMEWORKS,
        databases: PYTHON_DATABASES,
    },
    ManifestKind {
        file: "pyproject.toml",
        ecosystem: "python",
        extract: extract_pyproject,
        match_on: MatchOn::Dependencies,
        frameworks: PYTHON_FRAMEWORKS,
        databases: PYTHON_DATABASES,
    },
    ManifestKind {
        file: "package.json",
        ecosystem: "javascript",
        extract: extract_package_json,
        match_on: MatchOn::Dependencies,
        frameworks: JS_FRAMEWORKS,
        databases: JS_DATABASES,
    },
    ManifestKind {
        file: "pom.xml",
        ecosystem: "java",
        extract: extract_pom,
        match_on: MatchOn::Content,
        frameworks: JAVA_FRAMEWORKS,
        databases: JAVA_DATABASES,
    },
    ManifestKind {
        file: "build.gradle",
        ecosystem: "java",
        extract: extract_gradle,
        match_on: MatchOn::Content,
        frameworks: JAVA_FRAMEWORKS,
        databases: JAVA_DATABASES,
    },
    ManifestKind {
        file: "go.mod",
        ecosystem: "go",
        extract: extract_go_mod,
        match_on: MatchOn::Content,
        frameworks: GO_FRAMEWORKS,
        databases: GO_DATABASES,
    },
    ManifestKind {
        file: "Cargo.toml",
        ecosystem: "rust",
        extract: extract_cargo,
        match_on: MatchOn::Content,
        frameworks: RUST_FRAMEWORKS,
        databases: RUST_DATABASES,
    },
    ManifestKind {
        file: "Gemfile",
        ecosystem: "ruby",
        extract: extract_gemfile,
        match_on: MatchOn::Dependencies,
        frameworks: RUBY_FRAMEWORKS,
        databases: RUBY_DATABASES,
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestScan {
    pub frameworks: Vec<String>,
    pub databases: Vec<String>,
    /// Ecosystem name to dependency identifiers in declaration order.
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// One entry per manifest that exists but could not be parsed.
    pub warnings: Vec<String>,
}

/// Checks each known manifest at the root of `root` (never recursively).
pub fn scan_manifests(root: &Path) -> ManifestScan {
    let mut scan = ManifestScan::default();

    for kind in MANIFESTS {
        let path = root.join(kind.file);
        if !is_regular_file(&path) {
            continue;
        }
        let raw = read_file_safe(&path, MAX_MANIFEST_BYTES);
        let deps = match (kind.extract)(&raw) {
            Ok(deps) => deps,
            Err(reason) => {
                scan.warnings
                    .push(format!("{}: unparsable manifest ({})", kind.file, reason));
                continue;
            }
        };

        let lowered_deps: Vec<String> = deps.iter().map(|d| d.to_lowercase()).collect();
        let lowered_text = raw.to_lowercase();
        let hit = |key: &str| match kind.match_on {
            MatchOn::Content => lowered_text.contains(key),
            MatchOn::Dependencies => lowered_deps.iter().any(|d| d.contains(key)),
        };
        for (key, label) in kind.frameworks {
            if hit(key) {
                scan.frameworks.push(label.to_string());
            }
        }
        for (key, label) in kind.databases {
            if hit(key) {
                scan.databases.push(label.to_string());
            }
        }

        scan.dependencies
            .entry(kind.ecosystem.to_string())
            .or_default()
            .extend(deps);
    }

    for deps in scan.dependencies.values_mut() {
        dedup_preserving_order(deps);
        deps.truncate(MAX_DEPENDENCIES);
    }
    dedup_preserving_order(&mut scan.frameworks);
    dedup_preserving_order(&mut scan.databases);
    scan
}

/// True for a plain file. Symlinks are never followed, so a snapshot cannot
/// point the scanner at files outside itself.
pub fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_file())
        .unwrap_or(false)
}

pub fn dedup_preserving_order(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

fn extract_requirements(raw: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let mut part = line.trim();
        if part.is_empty() || part.starts_with('#') || part.starts_with('-') {
            continue;
        }
        if let Some((left, _)) = part.split_once('#') {
            part = left.trim();
        }
        if part.contains("git+") || part.contains("://") {
            continue;
        }
        let name = normalize_requirement_name(part);
        if !name.is_empty() {
            out.push(name);
        }
    }
    Ok(out)
}

/// `Django[argon2]>=3.2 ; python_version>"3.8"` -> `django`
fn normalize_requirement_name(line: &str) -> String {
    let s = line.trim();
    let mut cut = s.len();
    for op in ["==", ">=", "<=", "!=", "~=", ">", "<", ";", "@", " "] {
        if let Some(idx) = s.find(op) {
            cut = cut.min(idx);
        }
    }
    let mut name = s[..cut].trim();
    if let Some(idx) = name.find('[') {
        name = name[..idx].trim();
    }
    name.to_ascii_lowercase()
}

fn extract_pyproject(raw: &str) -> Result<Vec<String>, String> {
    let parsed: toml::Value = raw.parse::<toml::Value>().map_err(|e| e.message().to_string())?;
    let mut out = Vec::new();

    if let Some(list) = parsed
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        out.extend(
            list.iter()
                .filter_map(|v| v.as_str())
                .map(normalize_requirement_name)
                .filter(|n| !n.is_empty()),
        );
    }

    let poetry = parsed.get("tool").and_then(|t| t.get("poetry"));
    let poetry_tables = [
        poetry.and_then(|p| p.get("dependencies")),
        poetry
            .and_then(|p| p.get("group"))
            .and_then(|g| g.get("dev"))
            .and_then(|d| d.get("dependencies")),
    ];
    for table in poetry_tables.into_iter().flatten().filter_map(|t| t.as_table()) {
        out.extend(
            table
                .keys()
                .filter(|k| k.as_str() != "python")
                .map(|k| k.to_ascii_lowercase()),
        );
    }
    Ok(out)
}

/// `dependencies` first, then `devDependencies` names not already declared.
fn extract_package_json(raw: &str) -> Result<Vec<String>, String> {
    let json: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let mut out: Vec<String> = Vec::new();
    for group in ["dependencies", "devDependencies"] {
        let Some(obj) = json.get(group).and_then(|v| v.as_object()) else {
            continue;
        };
        for name in obj.keys() {
            if !out.iter().any(|existing| existing == name) {
                out.push(name.to_string());
            }
        }
    }
    Ok(out)
}

fn extract_pom(raw: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    for block in raw.split("<dependency>").skip(1) {
        let block = block.split("</dependency>").next().unwrap_or(block);
        let artifact = xml_tag_text(block, "artifactId");
        let group = xml_tag_text(block, "groupId");
        match (group, artifact) {
            (Some(g), Some(a)) => out.push(format!("{}:{}", g, a)),
            (None, Some(a)) => out.push(a.to_string()),
            _ => {}
        }
    }
    Ok(out)
}

fn xml_tag_text<'a>(block: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = block.find(&open)? + open.len();
    let len = block[start..].find(&close)?;
    let text = block[start..start + len].trim();
    (!text.is_empty()).then_some(text)
}

fn extract_gradle(raw: &str) -> Result<Vec<String>, String> {
    const CONFIGURATIONS: &[&str] = &[
        "implementation",
        "api",
        "compile",
        "compileOnly",
        "runtimeOnly",
        "testImplementation",
        "annotationProcessor",
    ];
    let mut out = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        let Some(config) = CONFIGURATIONS.iter().find(|c| {
            line.strip_prefix(**c)
                .map(|rest| rest.starts_with(|ch: char| ch == ' ' || ch == '('))
                .unwrap_or(false)
        }) else {
            continue;
        };
        let rest = &line[config.len()..];
        let Some(coordinate) = first_quoted(rest) else {
            continue;
        };
        let mut parts = coordinate.split(':');
        match (parts.next(), parts.next()) {
            (Some(g), Some(a)) if !g.is_empty() && !a.is_empty() => out.push(format!("{}:{}", g, a)),
            _ => {}
        }
    }
    Ok(out)
}

fn first_quoted(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c == '\'' || c == '"')?;
    let quote = s[start..].chars().next()?;
    let body = &s[start + 1..];
    let end = body.find(quote)?;
    Some(&body[..end])
}

fn extract_go_mod(raw: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut in_block = false;
    for line in raw.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(module) = line.split_whitespace().next() {
                out.push(module.to_string());
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
            } else if let Some(module) = rest.split_whitespace().next() {
                out.push(module.to_string());
            }
        }
    }
    Ok(out)
}

fn extract_cargo(raw: &str) -> Result<Vec<String>, String> {
    let parsed: toml::Value = raw.parse::<toml::Value>().map_err(|e| e.message().to_string())?;
    let tables = [
        parsed.get("dependencies"),
        parsed.get("dev-dependencies"),
        parsed
            .get("workspace")
            .and_then(|w| w.get("dependencies")),
    ];
    let mut out: Vec<String> = Vec::new();
    for table in tables.into_iter().flatten().filter_map(|t| t.as_table()) {
        for name in table.keys() {
            if !out.iter().any(|existing| existing == name) {
                out.push(name.to_string());
            }
        }
    }
    Ok(out)
}

fn extract_gemfile(raw: &str) -> Result<Vec<String>, String> {
    Ok(raw
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("gem "))
        .filter_map(first_quoted)
        .map(str::to_string)
        .collect())
}

/// Raw text of the files the narrative prompt quotes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFiles {
    pub readme: String,
    pub requirements: String,
    pub package_json: String,
    pub setup_py: String,
    pub pom_xml: String,
    pub cargo_toml: String,
    pub go_mod: String,
}

/// First existing candidate of each group, bounded to a short prefix.
pub fn read_key_files(root: &Path) -> KeyFiles {
    let first = |candidates: &[&str]| -> String {
        candidates
            .iter()
            .map(|name| root.join(name))
            .find(|p| is_regular_file(p))
            .map(|p| {
                // four bytes per char is the UTF-8 worst case
                let text = read_file_safe(&p, KEY_FILE_CHARS * 4);
                truncate_chars(&text, KEY_FILE_CHARS).to_string()
            })
            .unwrap_or_default()
    };
    KeyFiles {
        readme: first(README_CANDIDATES),
        requirements: first(&["requirements.txt", "requirements-dev.txt", "Pipfile"]),
        package_json: first(&["package.json"]),
        setup_py: first(&["setup.py", "setup.cfg", "pyproject.toml"]),
        pom_xml: first(&["pom.xml"]),
        cargo_toml: first(&["Cargo.toml"]),
        go_mod: first(&["go.mod"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn requirements_strip_version_operators() {
        let deps = extract_requirements(
            "flask==2.0.1\n# comment\nDjango>=3.2,<4.0\nrequests[socks] ~= 2.31\n-r base.txt\ngit+https://x/y.git\n\nuvicorn\n",
        )
        .unwrap();
        assert_eq!(deps, vec!["flask", "django", "requests", "uvicorn"]);
    }

    #[test]
    fn package_json_merges_groups_with_primary_precedence() {
        let deps = extract_package_json(
            r#"{
                "dependencies": { "zod": "^3", "react": "^18", "axios": "^1" },
                "devDependencies": { "vite": "^5", "react": "^18", "eslint": "^8" }
            }"#,
        )
        .unwrap();
        assert_eq!(deps, vec!["zod", "react", "axios", "vite", "eslint"]);
    }

    #[test]
    fn scans_python_manifest_signatures() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("requirements.txt"),
            "FastAPI==0.110\nsqlalchemy\npsycopg2-binary\nredis>=5\n",
        )
        .unwrap();

        let scan = scan_manifests(dir.path());
        assert_eq!(scan.frameworks, vec!["FastAPI", "SQLAlchemy"]);
        assert_eq!(scan.databases, vec!["PostgreSQL", "Redis"]);
        assert_eq!(
            scan.dependencies.get("python").unwrap(),
            &vec!["fastapi", "sqlalchemy", "psycopg2-binary", "redis"]
        );
        assert!(scan.warnings.is_empty());
    }

    #[test]
    fn database_matched_by_two_manifests_appears_once_at_first_position() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask\nredis\n").unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "dependencies": { "express": "^4", "ioredis": "^5", "react": "^18" } }"#,
        )
        .unwrap();

        let scan = scan_manifests(dir.path());
        assert_eq!(scan.frameworks, vec!["Flask", "React", "Express.js"]);
        assert_eq!(scan.databases, vec!["Redis"]);
        assert_eq!(scan.dependencies.len(), 2);
    }

    #[test]
    fn framework_matched_by_two_python_manifests_keeps_first_position() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "django\ncelery\n").unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\ndependencies = [\"django\", \"fastapi\", \"celery\"]\n",
        )
        .unwrap();

        let scan = scan_manifests(dir.path());
        assert_eq!(scan.frameworks, vec!["Django", "Celery", "FastAPI"]);
        assert_eq!(
            scan.dependencies.get("python").unwrap(),
            &vec!["django", "celery", "fastapi"]
        );
    }

    #[test]
    fn malformed_package_json_is_reported_and_does_not_stop_the_scan() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{ invalid json }").unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module example.com/app\n\ngo 1.22\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\tgorm.io/gorm v1.25.0 // indirect\n)\n",
        )
        .unwrap();

        let scan = scan_manifests(dir.path());
        assert!(!scan.dependencies.contains_key("javascript"));
        assert_eq!(scan.warnings.len(), 1);
        assert!(scan.warnings[0].starts_with("package.json"));
        assert_eq!(scan.frameworks, vec!["Gin"]);
        assert_eq!(scan.databases, vec!["GORM"]);
        assert_eq!(
            scan.dependencies.get("go").unwrap(),
            &vec!["github.com/gin-gonic/gin", "gorm.io/gorm"]
        );
    }

    #[test]
    fn cargo_and_pom_dependencies() {
        let deps = extract_cargo(
            "[package]\nname = \"x\"\n\n[dependencies]\naxum = \"0.7\"\nsqlx = { version = \"0.7\" }\n\n[dev-dependencies]\ntempfile = \"3\"\naxum = \"0.7\"\n",
        )
        .unwrap();
        assert_eq!(deps, vec!["axum", "sqlx", "tempfile"]);
        assert!(extract_cargo("[dependencies\n").is_err());

        let deps = extract_pom(
            "<project><dependencies><dependency><groupId>org.springframework.boot</groupId><artifactId>spring-boot-starter-web</artifactId></dependency><dependency><artifactId>junit</artifactId></dependency></dependencies></project>",
        )
        .unwrap();
        assert_eq!(
            deps,
            vec!["org.springframework.boot:spring-boot-starter-web", "junit"]
        );
    }

    #[test]
    fn gradle_gemfile_and_pyproject_dependencies() {
        let deps = extract_gradle(
            "dependencies {\n    implementation 'org.springframework.boot:spring-boot-starter:3.2.0'\n    testImplementation(\"junit:junit:4.13\")\n    apiDocs 'x:y:1'\n}\n",
        )
        .unwrap();
        assert_eq!(
            deps,
            vec!["org.springframework.boot:spring-boot-starter", "junit:junit"]
        );

        let deps = extract_gemfile("source 'https://rubygems.org'\ngem 'rails', '~> 7.1'\ngem \"pg\"\n").unwrap();
        assert_eq!(deps, vec!["rails", "pg"]);

        let deps = extract_pyproject(
            "[project]\ndependencies = [\"httpx>=0.27\", \"pydantic\"]\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\nDjango = \"^5\"\n",
        )
        .unwrap();
        assert_eq!(deps, vec!["httpx", "pydantic", "django"]);
    }

    #[test]
    fn dependency_lists_are_bounded() {
        let dir = tempdir().unwrap();
        let body: String = (0..45).map(|i| format!("pkg{}==1.0\n", i)).collect();
        fs::write(dir.path().join("requirements.txt"), body).unwrap();
        let scan = scan_manifests(dir.path());
        let python = scan.dependencies.get("python").unwrap();
        assert_eq!(python.len(), MAX_DEPENDENCIES);
        assert_eq!(python[0], "pkg0");
    }

    #[test]
    fn nested_manifests_are_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("web")).unwrap();
        fs::write(dir.path().join("web/package.json"), r#"{"dependencies":{"react":"18"}}"#).unwrap();
        assert_eq!(scan_manifests(dir.path()), ManifestScan::default());
    }

    #[test]
    fn key_files_pick_first_existing_candidate() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.rst"), "Title\n=====\n").unwrap();
        fs::write(dir.path().join("requirements-dev.txt"), "pytest\n").unwrap();
        let files = read_key_files(dir.path());
        assert_eq!(files.readme, "Title\n=====\n");
        assert_eq!(files.requirements, "pytest\n");
        assert!(files.package_json.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_root_files_are_not_followed() {
        let outside = tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, "TOPSECRET_TOKEN=abc123\n").unwrap();

        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(&secret, dir.path().join("requirements.txt")).unwrap();
        std::os::unix::fs::symlink(&secret, dir.path().join("README.md")).unwrap();
        fs::write(dir.path().join("README.txt"), "local readme").unwrap();

        let scan = scan_manifests(dir.path());
        assert!(!scan.dependencies.contains_key("python"));
        assert!(scan.warnings.is_empty());

        let files = read_key_files(dir.path());
        assert_eq!(files.readme, "local readme");
        assert!(files.requirements.is_empty());
    }
}
