//! Build-file compiler.
//!
//! Resolves the dependency list, then renders either a Maven descriptor or
//! a Gradle build+settings pair (Groovy or Kotlin DSL) plus the wrapper
//! files the chosen build tool needs. DSL-specific fix-ups force a
//! consistent toolchain version string and append a main-class declaration
//! block when absent.

use serde_json::json;
use specforge_core::casing::to_upper_camel;
use specforge_core::spec::{ApplicationSpec, BuildTool, Packaging, TargetLanguage};

use crate::deps::{
    render_gradle, render_maven, render_maven_processors, resolve, DependencyLookup,
};
use crate::error::CodegenError;
use crate::renderer::Renderer;

/// Managed platform versions pinned by the generator.
pub const SPRING_BOOT_VERSION: &str = "3.4.1";
pub const DEPENDENCY_MANAGEMENT_VERSION: &str = "1.1.7";
pub const KOTLIN_VERSION: &str = "1.9.25";
const GRADLE_VERSION: &str = "8.11.1";
const MAVEN_VERSION: &str = "3.9.9";

/// Main application class simple name, derived from the artifact id.
pub fn application_class(spec: &ApplicationSpec) -> String {
    format!("{}Application", to_upper_camel(&spec.app.artifact))
}

pub struct BuildFileCompiler;

impl BuildFileCompiler {
    /// Compile the build descriptor and wrapper files. Returns
    /// `(relative path, content)` pairs.
    pub async fn compile(
        spec: &ApplicationSpec,
        extra_tokens: &[String],
        lookup: &dyn DependencyLookup,
        renderer: &Renderer,
    ) -> Result<Vec<(String, String)>, CodegenError> {
        let tokens = dependency_tokens(spec, extra_tokens);
        let dependencies = resolve(&tokens, spec.datastore, lookup).await?;

        let kotlin = spec.language == TargetLanguage::Kotlin;
        let main_class = main_class_reference(spec);

        let mut files = Vec::new();
        match spec.app.build_tool {
            BuildTool::Maven => {
                let model = json!({
                    "group": spec.app.group,
                    "artifact": spec.app.artifact,
                    "version": spec.app.version,
                    "name": spec.app.name,
                    "description": spec.app.description,
                    "war": spec.app.packaging == Packaging::War,
                    "runtimeVersion": spec.app.runtime_version,
                    "kotlin": kotlin,
                    "kotlinVersion": KOTLIN_VERSION,
                    "bootVersion": SPRING_BOOT_VERSION,
                    "dependenciesXml": render_maven(&dependencies),
                    "processorsXml": render_maven_processors(&dependencies),
                });
                let pom = renderer.render(&["common/pom".to_string()], &model)?;
                files.push(("pom.xml".to_string(), pom));
                files.push((
                    ".mvn/wrapper/maven-wrapper.properties".to_string(),
                    maven_wrapper_properties(),
                ));
                files.push(("mvnw".to_string(), mvnw_script()));
                files.push(("mvnw.cmd".to_string(), mvnw_cmd_script()));
            }
            BuildTool::Gradle | BuildTool::GradleKotlin => {
                let kotlin_dsl = spec.app.build_tool == BuildTool::GradleKotlin;
                let model = json!({
                    "group": spec.app.group,
                    "artifact": spec.app.artifact,
                    "version": spec.app.version,
                    "war": spec.app.packaging == Packaging::War,
                    "runtimeVersion": spec.app.runtime_version,
                    "kotlin": kotlin,
                    "kotlinVersion": KOTLIN_VERSION,
                    "bootVersion": SPRING_BOOT_VERSION,
                    "dmVersion": DEPENDENCY_MANAGEMENT_VERSION,
                    "dependencyLines": render_gradle(&dependencies, kotlin_dsl),
                });
                let (build_template, build_path, settings_template, settings_path) = if kotlin_dsl {
                    (
                        "common/build_gradle_kts",
                        "build.gradle.kts",
                        "common/settings_gradle_kts",
                        "settings.gradle.kts",
                    )
                } else {
                    (
                        "common/build_gradle",
                        "build.gradle",
                        "common/settings_gradle",
                        "settings.gradle",
                    )
                };

                let mut build = renderer.render(&[build_template.to_string()], &model)?;
                build = force_toolchain(&build, &spec.app.runtime_version);
                build = ensure_main_class(&build, &main_class, kotlin_dsl);
                files.push((build_path.to_string(), build));

                let settings = renderer.render(&[settings_template.to_string()], &model)?;
                files.push((settings_path.to_string(), settings));
                files.push((
                    "gradle/wrapper/gradle-wrapper.properties".to_string(),
                    gradle_wrapper_properties(),
                ));
                files.push(("gradlew".to_string(), gradlew_script()));
                files.push(("gradlew.bat".to_string(), gradlew_bat_script()));
            }
        }

        Ok(files)
    }
}

/// All dependency tokens for the build: the fixed starters, the
/// language/boilerplate extras, the spec's own tokens, and the tokens
/// stages added during the run.
fn dependency_tokens(spec: &ApplicationSpec, extra_tokens: &[String]) -> Vec<String> {
    let mut tokens = vec![
        "web".to_string(),
        "validation".to_string(),
        "test".to_string(),
    ];
    if spec.language == TargetLanguage::Java
        && spec.boilerplate == specforge_core::spec::BoilerplateStyle::GeneratedAccessors
    {
        tokens.push("lombok".to_string());
    }
    if spec.language == TargetLanguage::Kotlin {
        tokens.push("com.fasterxml.jackson.module:jackson-module-kotlin".to_string());
        tokens.push("org.jetbrains.kotlin:kotlin-reflect".to_string());
    }
    tokens.extend(spec.dependencies.iter().cloned());
    tokens.extend(extra_tokens.iter().cloned());
    tokens
}

/// Fully-qualified main class. Kotlin's top-level `main` compiles to a
/// `*Kt` class.
fn main_class_reference(spec: &ApplicationSpec) -> String {
    let class = application_class(spec);
    match spec.language {
        TargetLanguage::Java => format!("{}.{class}", spec.base_package),
        TargetLanguage::Kotlin => format!("{}.{class}Kt", spec.base_package),
    }
}

// ---------------------------------------------------------------------------
// DSL fix-ups
// ---------------------------------------------------------------------------

/// Force every `JavaLanguageVersion.of(...)` occurrence to the normalized
/// runtime version.
pub fn force_toolchain(content: &str, runtime_version: &str) -> String {
    content
        .lines()
        .map(|line| {
            match line.find("JavaLanguageVersion.of(") {
                Some(start) => {
                    let prefix_end = start + "JavaLanguageVersion.of(".len();
                    match line[prefix_end..].find(')') {
                        Some(close) => format!(
                            "{}{runtime_version}{}",
                            &line[..prefix_end],
                            &line[prefix_end + close..]
                        ),
                        None => line.to_string(),
                    }
                }
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        + if content.ends_with('\n') { "\n" } else { "" }
}

/// Append a `springBoot { mainClass }` block when the build script does not
/// declare one.
pub fn ensure_main_class(content: &str, main_class: &str, kotlin_dsl: bool) -> String {
    if content.contains("mainClass") {
        return content.to_string();
    }
    let block = if kotlin_dsl {
        format!("\nspringBoot {{\n    mainClass.set(\"{main_class}\")\n}}\n")
    } else {
        format!("\nspringBoot {{\n    mainClass = '{main_class}'\n}}\n")
    };
    format!("{}{block}", content.trim_end_matches('\n'))
}

// ---------------------------------------------------------------------------
// Wrapper files
// ---------------------------------------------------------------------------

fn gradle_wrapper_properties() -> String {
    format!(
        "distributionBase=GRADLE_USER_HOME\n\
         distributionPath=wrapper/dists\n\
         distributionUrl=https\\://services.gradle.org/distributions/gradle-{GRADLE_VERSION}-bin.zip\n\
         networkTimeout=10000\n\
         validateDistributionUrl=true\n\
         zipStoreBase=GRADLE_USER_HOME\n\
         zipStorePath=wrapper/dists\n"
    )
}

fn maven_wrapper_properties() -> String {
    format!(
        "wrapperVersion=3.3.2\n\
         distributionType=only-script\n\
         distributionUrl=https://repo.maven.apache.org/maven2/org/apache/maven/apache-maven/{MAVEN_VERSION}/apache-maven-{MAVEN_VERSION}-bin.zip\n"
    )
}

fn gradlew_script() -> String {
    r#"#!/bin/sh
# Gradle start up script. Run `gradle wrapper` once to materialize the
# wrapper jar if it is missing.

DIR=$(dirname "$0")
APP_HOME=$(cd "$DIR" && pwd)
CLASSPATH="$APP_HOME/gradle/wrapper/gradle-wrapper.jar"

if [ -n "$JAVA_HOME" ]; then
    JAVACMD="$JAVA_HOME/bin/java"
else
    JAVACMD=java
fi

exec "$JAVACMD" -classpath "$CLASSPATH" org.gradle.wrapper.GradleWrapperMain "$@"
"#
    .to_string()
}

fn gradlew_bat_script() -> String {
    "@rem Gradle startup script for Windows\r\n\
     @echo off\r\n\
     set DIR=%~dp0\r\n\
     set CLASSPATH=%DIR%gradle\\wrapper\\gradle-wrapper.jar\r\n\
     if defined JAVA_HOME (set JAVACMD=%JAVA_HOME%\\bin\\java.exe) else (set JAVACMD=java.exe)\r\n\
     \"%JAVACMD%\" -classpath \"%CLASSPATH%\" org.gradle.wrapper.GradleWrapperMain %*\r\n"
        .to_string()
}

fn mvnw_script() -> String {
    format!(
        r#"#!/bin/sh
# Apache Maven wrapper (script-only distribution). Downloads Maven as
# declared in .mvn/wrapper/maven-wrapper.properties on first use.

DIR=$(dirname "$0")
APP_HOME=$(cd "$DIR" && pwd)
PROPS="$APP_HOME/.mvn/wrapper/maven-wrapper.properties"
DIST_URL=$(sed -n 's/^distributionUrl=//p' "$PROPS")
MVN_HOME="${{MAVEN_USER_HOME:-$HOME/.m2}}/wrapper/dists/apache-maven-{MAVEN_VERSION}"

if [ ! -x "$MVN_HOME/bin/mvn" ]; then
    mkdir -p "$MVN_HOME"
    curl -fsSL "$DIST_URL" -o "$MVN_HOME/maven.zip"
    unzip -q "$MVN_HOME/maven.zip" -d "$MVN_HOME/.."
    mv "$MVN_HOME/../apache-maven-{MAVEN_VERSION}"/* "$MVN_HOME"
    rm -f "$MVN_HOME/maven.zip"
fi

exec "$MVN_HOME/bin/mvn" "$@"
"#
    )
}

fn mvnw_cmd_script() -> String {
    "@echo off\r\n\
     rem Apache Maven wrapper for Windows. See .mvn/wrapper/maven-wrapper.properties.\r\n\
     mvn %*\r\n"
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
