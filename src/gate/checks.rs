use serde_json::Value;

use crate::config::Thresholds;
use crate::runner::ToolOutput;

/// How a check's verdict is derived from its tool run.
#[derive(Debug, Clone, Copy)]
pub enum Verdict {
    /// Nonzero exit means failed.
    ExitCode,
    /// Parse radon's JSON output and fail when any block exceeds the
    /// complexity ceiling.
    RadonComplexity,
}

/// One entry in the gate's fixed battery: name, weight, tool, and how to
/// invoke and judge it.
pub struct CheckSpec {
    pub name: &'static str,
    pub weight: u32,
    pub tool: &'static str,
    pub verdict: Verdict,
    args: fn(&Thresholds) -> Vec<String>,
}

impl CheckSpec {
    pub fn args(&self, thresholds: &Thresholds) -> Vec<String> {
        (self.args)(thresholds)
    }

    /// Judge a finished tool run. Returns `None` when passed, otherwise a
    /// failure detail.
    pub fn judge(&self, output: &ToolOutput, thresholds: &Thresholds) -> Option<String> {
        match self.verdict {
            Verdict::ExitCode => (!output.success())
                .then(|| format!("{} exited with code {}", self.tool, output.code)),
            Verdict::RadonComplexity => {
                judge_complexity(&output.stdout, thresholds.max_complexity)
            }
        }
    }
}

/// The ten checks, in their fixed reporting order. Weights sum to 195;
/// the per-run denominator only counts checks whose tool is present.
pub fn battery() -> [CheckSpec; 10] {
    [
        CheckSpec {
            name: "coverage",
            weight: 25,
            tool: "coverage",
            verdict: Verdict::ExitCode,
            args: |t| svec(["report", &format!("--fail-under={}", t.min_coverage)]),
        },
        CheckSpec {
            name: "complexity",
            weight: 20,
            tool: "radon",
            verdict: Verdict::RadonComplexity,
            args: |_| svec(["cc", ".", "-s", "-j"]),
        },
        CheckSpec {
            name: "duplication",
            weight: 15,
            tool: "jscpd",
            verdict: Verdict::ExitCode,
            args: |t| svec([".", &format!("--threshold={}", t.max_duplication)]),
        },
        CheckSpec {
            name: "formatting",
            weight: 10,
            tool: "black",
            verdict: Verdict::ExitCode,
            args: |t| {
                svec([
                    "--check",
                    &format!("--line-length={}", t.max_line_length),
                    ".",
                ])
            },
        },
        CheckSpec {
            name: "import-order",
            weight: 10,
            tool: "isort",
            verdict: Verdict::ExitCode,
            args: |_| svec(["--check-only", "."]),
        },
        CheckSpec {
            name: "lint",
            weight: 15,
            tool: "ruff",
            verdict: Verdict::ExitCode,
            args: |_| svec(["check", "."]),
        },
        CheckSpec {
            name: "type-check",
            weight: 15,
            tool: "mypy",
            verdict: Verdict::ExitCode,
            args: |_| svec(["."]),
        },
        CheckSpec {
            name: "security",
            weight: 20,
            tool: "bandit",
            verdict: Verdict::ExitCode,
            args: |_| svec(["-r", ".", "-q"]),
        },
        CheckSpec {
            name: "dependency-audit",
            weight: 20,
            tool: "pip-audit",
            verdict: Verdict::ExitCode,
            args: |_| Vec::new(),
        },
        CheckSpec {
            name: "test-execution",
            weight: 25,
            tool: "pytest",
            verdict: Verdict::ExitCode,
            args: |_| svec(["-q"]),
        },
    ]
}

fn svec<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

/// Count radon blocks above the ceiling. Radon's `-j` output maps each
/// file to a list of blocks with a numeric `complexity`.
fn judge_complexity(stdout: &str, max_complexity: u32) -> Option<String> {
    let parsed: Value = match serde_json::from_str(stdout) {
        Ok(value) => value,
        Err(err) => return Some(format!("unparsable radon output: {err}")),
    };

    let mut offenders = 0u32;
    if let Value::Object(files) = &parsed {
        for blocks in files.values() {
            if let Value::Array(blocks) = blocks {
                for block in blocks {
                    let complexity = block
                        .get("complexity")
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    if complexity > u64::from(max_complexity) {
                        offenders += 1;
                    }
                }
            }
        }
    }

    (offenders > 0).then(|| {
        format!("{offenders} block(s) exceed cyclomatic complexity {max_complexity}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(code: i32, stdout: &str) -> ToolOutput {
        ToolOutput {
            code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_battery_order_and_weights() {
        let battery = battery();
        let names: Vec<_> = battery.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            [
                "coverage",
                "complexity",
                "duplication",
                "formatting",
                "import-order",
                "lint",
                "type-check",
                "security",
                "dependency-audit",
                "test-execution",
            ]
        );
        let total: u32 = battery.iter().map(|c| c.weight).sum();
        assert_eq!(total, 195);
    }

    #[test]
    fn test_exit_code_verdict() {
        let spec = &battery()[0];
        let thresholds = Thresholds::default();
        assert!(spec.judge(&output(0, ""), &thresholds).is_none());
        let detail = spec.judge(&output(2, ""), &thresholds).unwrap();
        assert!(detail.contains("code 2"));
    }

    #[test]
    fn test_complexity_verdict_parses_radon_json() {
        let thresholds = Thresholds::default(); // ceiling 10
        let radon = r#"{"app.py": [
            {"type": "function", "name": "simple", "complexity": 3},
            {"type": "function", "name": "gnarly", "complexity": 14}
        ]}"#;

        let detail = judge_complexity(radon, thresholds.max_complexity).unwrap();
        assert!(detail.contains("1 block(s)"));

        // Even a nonzero radon exit passes through the parser unchanged;
        // the verdict is about content
        assert!(judge_complexity(r#"{"app.py": []}"#, 10).is_none());
        assert!(judge_complexity("not json", 10).is_some());
    }

    #[test]
    fn test_args_embed_thresholds() {
        let battery = battery();
        let strict = crate::config::ThresholdPreset::Strict.thresholds();

        let coverage = &battery[0];
        assert!(coverage
            .args(&strict)
            .contains(&"--fail-under=90".to_string()));

        let duplication = &battery[2];
        assert!(duplication
            .args(&strict)
            .contains(&"--threshold=2".to_string()));

        let formatting = &battery[3];
        assert!(formatting
            .args(&strict)
            .contains(&"--line-length=120".to_string()));
    }
}
