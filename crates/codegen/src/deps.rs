//! Dependency token resolution and build-tool rendering.
//!
//! Tokens are logical aliases (`"web"`, `"lombok"`) or raw
//! `group:artifact[:scope]` triples. The alias and database tables are
//! immutable package-level data; unknown single-word tokens fall back to a
//! remote lookup-by-keyword collaborator.

use std::collections::HashSet;

use async_trait::async_trait;
use specforge_core::spec::Datastore;

use crate::error::CodegenError;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Normalized dependency scope across build tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Implementation,
    CompileOnly,
    AnnotationProcessor,
    RuntimeOnly,
    ProvidedRuntime,
    TestImplementation,
}

impl Scope {
    fn from_token(token: &str) -> Self {
        match token {
            "runtime" | "runtimeOnly" => Self::RuntimeOnly,
            "test" | "testImplementation" => Self::TestImplementation,
            "compileOnly" => Self::CompileOnly,
            "annotationProcessor" => Self::AnnotationProcessor,
            "provided" | "providedRuntime" => Self::ProvidedRuntime,
            _ => Self::Implementation,
        }
    }

    /// Gradle configuration name for this scope.
    fn gradle_configuration(self) -> &'static str {
        match self {
            Self::Implementation => "implementation",
            Self::CompileOnly => "compileOnly",
            Self::AnnotationProcessor => "annotationProcessor",
            Self::RuntimeOnly => "runtimeOnly",
            Self::ProvidedRuntime => "providedRuntime",
            Self::TestImplementation => "testImplementation",
        }
    }
}

/// One resolved build dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    /// `None` when the version is managed by the Boot BOM.
    pub version: Option<String>,
    pub scope: Scope,
    pub optional: bool,
}

impl Dependency {
    fn new(group: &str, artifact: &str, scope: Scope) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: None,
            scope,
            optional: false,
        }
    }

    fn versioned(group: &str, artifact: &str, version: &str, scope: Scope) -> Self {
        Self {
            version: Some(version.to_string()),
            ..Self::new(group, artifact, scope)
        }
    }

    fn coordinates(&self) -> String {
        match &self.version {
            Some(version) => format!("{}:{}:{version}", self.group, self.artifact),
            None => format!("{}:{}", self.group, self.artifact),
        }
    }
}

// ---------------------------------------------------------------------------
// Alias tables
// ---------------------------------------------------------------------------

/// Pinned versions for artifacts outside the Boot BOM.
const SPRINGDOC_VERSION: &str = "2.6.0";
const MAPSTRUCT_VERSION: &str = "1.6.3";

/// Resolve a logical alias to its dependency set. Processor-pair aliases
/// (lombok, mapstruct) expand to two entries on the same coordinates.
fn resolve_alias(token: &str) -> Option<Vec<Dependency>> {
    let starter = |artifact: &str| {
        vec![Dependency::new(
            "org.springframework.boot",
            artifact,
            Scope::Implementation,
        )]
    };

    match token {
        "web" => Some(starter("spring-boot-starter-web")),
        "validation" => Some(starter("spring-boot-starter-validation")),
        "persistence" | "data-jpa" => Some(starter("spring-boot-starter-data-jpa")),
        "data-mongodb" => Some(starter("spring-boot-starter-data-mongodb")),
        "security" => Some(starter("spring-boot-starter-security")),
        "actuator" | "ops" => Some(starter("spring-boot-starter-actuator")),
        "test" => Some(vec![Dependency::new(
            "org.springframework.boot",
            "spring-boot-starter-test",
            Scope::TestImplementation,
        )]),
        "lombok" => Some(vec![
            Dependency::new("org.projectlombok", "lombok", Scope::CompileOnly),
            Dependency::new("org.projectlombok", "lombok", Scope::AnnotationProcessor),
        ]),
        "mapstruct" => Some(vec![
            Dependency::versioned(
                "org.mapstruct",
                "mapstruct",
                MAPSTRUCT_VERSION,
                Scope::Implementation,
            ),
            Dependency::versioned(
                "org.mapstruct",
                "mapstruct-processor",
                MAPSTRUCT_VERSION,
                Scope::AnnotationProcessor,
            ),
        ]),
        "openapi" | "springdoc" => Some(vec![Dependency::versioned(
            "org.springdoc",
            "springdoc-openapi-starter-webmvc-ui",
            SPRINGDOC_VERSION,
            Scope::Implementation,
        )]),
        "postgres" | "postgresql" => Some(vec![Dependency::new(
            "org.postgresql",
            "postgresql",
            Scope::RuntimeOnly,
        )]),
        "mysql" => Some(vec![Dependency::new(
            "com.mysql",
            "mysql-connector-j",
            Scope::RuntimeOnly,
        )]),
        "mariadb" => Some(vec![Dependency::new(
            "org.mariadb.jdbc",
            "mariadb-java-client",
            Scope::RuntimeOnly,
        )]),
        "mssql" => Some(vec![Dependency::new(
            "com.microsoft.sqlserver",
            "mssql-jdbc",
            Scope::RuntimeOnly,
        )]),
        "h2" => Some(vec![Dependency::new(
            "com.h2database",
            "h2",
            Scope::RuntimeOnly,
        )]),
        _ => None,
    }
}

/// Driver and starter entries for a declared datastore.
pub fn datastore_dependencies(datastore: Datastore) -> Vec<Dependency> {
    let driver = |alias: &str| resolve_alias(alias).unwrap_or_default();
    match datastore {
        Datastore::None => Vec::new(),
        Datastore::Postgres => [resolve_alias("data-jpa").unwrap(), driver("postgres")].concat(),
        Datastore::Mysql => [resolve_alias("data-jpa").unwrap(), driver("mysql")].concat(),
        Datastore::Mariadb => [resolve_alias("data-jpa").unwrap(), driver("mariadb")].concat(),
        Datastore::Mssql => [resolve_alias("data-jpa").unwrap(), driver("mssql")].concat(),
        Datastore::H2 => [resolve_alias("data-jpa").unwrap(), driver("h2")].concat(),
        Datastore::Mongodb => resolve_alias("data-mongodb").unwrap(),
    }
}

// ---------------------------------------------------------------------------
// Remote lookup collaborator
// ---------------------------------------------------------------------------

/// Looks up an unknown single-word token by keyword.
#[async_trait]
pub trait DependencyLookup: Send + Sync {
    async fn lookup(&self, keyword: &str) -> Result<Option<Dependency>, CodegenError>;
}

/// Lookup that always misses. Used in tests and offline runs.
pub struct NoLookup;

#[async_trait]
impl DependencyLookup for NoLookup {
    async fn lookup(&self, _keyword: &str) -> Result<Option<Dependency>, CodegenError> {
        Ok(None)
    }
}

/// Keyword lookup against the Maven Central search API.
pub struct MavenCentralLookup {
    client: reqwest::Client,
    base_url: String,
}

impl MavenCentralLookup {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://search.maven.org/solrsearch/select".to_string(),
        }
    }
}

impl Default for MavenCentralLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DependencyLookup for MavenCentralLookup {
    async fn lookup(&self, keyword: &str) -> Result<Option<Dependency>, CodegenError> {
        let response: serde_json::Value = self
            .client
            .get(&self.base_url)
            .query(&[("q", keyword), ("rows", "1"), ("wt", "json")])
            .send()
            .await
            .map_err(|e| CodegenError::Lookup(e.to_string()))?
            .json()
            .await
            .map_err(|e| CodegenError::Lookup(e.to_string()))?;

        let Some(doc) = response["response"]["docs"].get(0) else {
            return Ok(None);
        };
        let (Some(group), Some(artifact)) = (doc["g"].as_str(), doc["a"].as_str()) else {
            return Ok(None);
        };

        let mut dependency = Dependency::new(group, artifact, Scope::Implementation);
        dependency.version = doc["latestVersion"].as_str().map(str::to_string);
        Ok(Some(dependency))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Parse a raw `group:artifact[:scope]` triple. Triples with an empty group
/// or artifact are invalid and dropped.
fn parse_raw(token: &str) -> Option<Dependency> {
    let mut parts = token.split(':');
    let group = parts.next()?.trim();
    let artifact = parts.next()?.trim();
    if group.is_empty() || artifact.is_empty() {
        return None;
    }
    let scope = parts
        .next()
        .map(Scope::from_token)
        .unwrap_or(Scope::Implementation);
    Some(Dependency::new(group, artifact, scope))
}

/// Resolve a list of tokens plus a datastore selection into a de-duplicated
/// dependency list.
///
/// - Alias tokens expand via the fixed table.
/// - Raw triples parse directly; invalid ones are dropped, not errors.
/// - Unknown single-word tokens go through the remote lookup; misses are
///   dropped with a warning.
pub async fn resolve(
    tokens: &[String],
    datastore: Datastore,
    lookup: &dyn DependencyLookup,
) -> Result<Vec<Dependency>, CodegenError> {
    let mut resolved = datastore_dependencies(datastore);

    for token in tokens {
        if let Some(mut aliased) = resolve_alias(token) {
            resolved.append(&mut aliased);
        } else if token.contains(':') {
            match parse_raw(token) {
                Some(dependency) => resolved.push(dependency),
                None => tracing::warn!(token, "Dropping invalid dependency triple"),
            }
        } else {
            match lookup.lookup(token).await? {
                Some(dependency) => resolved.push(dependency),
                None => tracing::warn!(token, "Unknown dependency token, dropping"),
            }
        }
    }

    // De-duplicate on (group, artifact, scope), keeping first occurrence.
    let mut seen = HashSet::new();
    resolved.retain(|d| seen.insert((d.group.clone(), d.artifact.clone(), d.scope)));
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render Maven `<dependency>` blocks for all non-processor entries.
/// Annotation processors are rendered separately for the compiler plugin.
pub fn render_maven(dependencies: &[Dependency]) -> String {
    let mut blocks = Vec::new();
    for dependency in dependencies {
        if dependency.scope == Scope::AnnotationProcessor {
            continue;
        }
        let mut lines = vec![
            "        <dependency>".to_string(),
            format!("            <groupId>{}</groupId>", dependency.group),
            format!("            <artifactId>{}</artifactId>", dependency.artifact),
        ];
        if let Some(version) = &dependency.version {
            lines.push(format!("            <version>{version}</version>"));
        }
        match dependency.scope {
            Scope::RuntimeOnly => lines.push("            <scope>runtime</scope>".to_string()),
            Scope::TestImplementation => {
                lines.push("            <scope>test</scope>".to_string())
            }
            Scope::CompileOnly => {
                lines.push("            <scope>provided</scope>".to_string());
                lines.push("            <optional>true</optional>".to_string());
            }
            Scope::ProvidedRuntime => {
                lines.push("            <scope>provided</scope>".to_string())
            }
            Scope::Implementation | Scope::AnnotationProcessor => {}
        }
        if dependency.optional && dependency.scope != Scope::CompileOnly {
            lines.push("            <optional>true</optional>".to_string());
        }
        lines.push("        </dependency>".to_string());
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n")
}

/// Render Maven `<path>` entries for the compiler plugin's
/// `annotationProcessorPaths` section.
pub fn render_maven_processors(dependencies: &[Dependency]) -> String {
    let mut blocks = Vec::new();
    for dependency in dependencies {
        if dependency.scope != Scope::AnnotationProcessor {
            continue;
        }
        let mut lines = vec![
            "                        <path>".to_string(),
            format!("                            <groupId>{}</groupId>", dependency.group),
            format!(
                "                            <artifactId>{}</artifactId>",
                dependency.artifact
            ),
        ];
        if let Some(version) = &dependency.version {
            lines.push(format!(
                "                            <version>{version}</version>"
            ));
        }
        lines.push("                        </path>".to_string());
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n")
}

/// Render Gradle configuration lines, one per dependency, grouped by scope.
pub fn render_gradle(dependencies: &[Dependency], kotlin_dsl: bool) -> String {
    let mut ordered: Vec<&Dependency> = dependencies.iter().collect();
    ordered.sort_by_key(|d| (d.scope, d.group.clone(), d.artifact.clone()));

    ordered
        .iter()
        .map(|dependency| {
            let configuration = dependency.scope.gradle_configuration();
            let coordinates = dependency.coordinates();
            if kotlin_dsl {
                format!("    {configuration}(\"{coordinates}\")")
            } else {
                format!("    {configuration} '{coordinates}'")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn lombok_expands_to_processor_pair() {
        let resolved = resolve(&tokens(&["lombok"]), Datastore::None, &NoLookup)
            .await
            .unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].scope, Scope::CompileOnly);
        assert_eq!(resolved[1].scope, Scope::AnnotationProcessor);
        assert_eq!(resolved[0].coordinates(), resolved[1].coordinates());
    }

    #[tokio::test]
    async fn raw_triple_with_empty_artifact_is_dropped() {
        let resolved = resolve(&tokens(&["com.acme::runtime"]), Datastore::None, &NoLookup)
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn raw_triple_parses_scope() {
        let resolved = resolve(
            &tokens(&["com.acme:acme-sdk:test"]),
            Datastore::None,
            &NoLookup,
        )
        .await
        .unwrap();
        assert_eq!(resolved[0].group, "com.acme");
        assert_eq!(resolved[0].artifact, "acme-sdk");
        assert_eq!(resolved[0].scope, Scope::TestImplementation);
    }

    #[tokio::test]
    async fn unknown_single_word_token_is_dropped_on_lookup_miss() {
        let resolved = resolve(&tokens(&["frobnicator"]), Datastore::None, &NoLookup)
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn datastore_selection_adds_starter_and_driver() {
        let resolved = resolve(&[], Datastore::Postgres, &NoLookup).await.unwrap();
        assert!(resolved
            .iter()
            .any(|d| d.artifact == "spring-boot-starter-data-jpa"));
        assert!(resolved
            .iter()
            .any(|d| d.artifact == "postgresql" && d.scope == Scope::RuntimeOnly));
    }

    #[tokio::test]
    async fn duplicates_are_removed() {
        let resolved = resolve(
            &tokens(&["web", "web", "org.springframework.boot:spring-boot-starter-web"]),
            Datastore::None,
            &NoLookup,
        )
        .await
        .unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn maven_rendering_handles_scopes() {
        let dependencies = vec![
            Dependency::new("org.springframework.boot", "spring-boot-starter-web", Scope::Implementation),
            Dependency::new("org.postgresql", "postgresql", Scope::RuntimeOnly),
            Dependency::new("org.projectlombok", "lombok", Scope::CompileOnly),
            Dependency::new("org.projectlombok", "lombok", Scope::AnnotationProcessor),
        ];
        let xml = render_maven(&dependencies);
        assert!(xml.contains("<artifactId>spring-boot-starter-web</artifactId>"));
        assert!(xml.contains("<scope>runtime</scope>"));
        assert!(xml.contains("<optional>true</optional>"));
        // Processor entries go to the compiler plugin, not <dependencies>.
        assert_eq!(xml.matches("lombok").count(), 1);

        let paths = render_maven_processors(&dependencies);
        assert!(paths.contains("<artifactId>lombok</artifactId>"));
    }

    #[test]
    fn gradle_rendering_uses_configuration_names() {
        let dependencies = vec![
            Dependency::new("org.projectlombok", "lombok", Scope::AnnotationProcessor),
            Dependency::new("org.projectlombok", "lombok", Scope::CompileOnly),
            Dependency::new("org.springframework.boot", "spring-boot-starter-web", Scope::Implementation),
        ];
        let groovy = render_gradle(&dependencies, false);
        assert!(groovy.contains("implementation 'org.springframework.boot:spring-boot-starter-web'"));
        assert!(groovy.contains("compileOnly 'org.projectlombok:lombok'"));
        assert!(groovy.contains("annotationProcessor 'org.projectlombok:lombok'"));

        let kts = render_gradle(&dependencies, true);
        assert!(kts.contains("implementation(\"org.springframework.boot:spring-boot-starter-web\")"));
    }

    #[test]
    fn gradle_lines_are_ordered_by_scope_then_coordinates() {
        let dependencies = vec![
            Dependency::new("b", "late", Scope::TestImplementation),
            Dependency::new("a", "early", Scope::Implementation),
        ];
        let rendered = render_gradle(&dependencies, false);
        let first = rendered.lines().next().unwrap();
        assert!(first.contains("a:early"));
    }
}
