//! Runner façade tests: validation batches, expansion failures, caching and filtering.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dataprovider::runner::{InvocationResult, SilentListener};
use dataprovider::source::{
    DataSourceCandidate, FieldSignature, FieldType, MethodSignature, ReturnShape, Visibility, shared,
};
use dataprovider::{
    BoxError, ConfigurationError, DataProviderRunner, Description, ExpansionError, ExtendedDataProvider, HostError,
    Invocation, MethodFilter, ParameterRow, ProviderResult, RunConfig, RunError, RunListener, RunSummary, Statement,
    SuiteRegistry, TestDefinition, TestHost, TestId, UseDataProvider, Value, rows,
};

fn counting_suite(calls: Rc<Cell<usize>>) -> SuiteRegistry {
    let mut registry = SuiteRegistry::new();
    registry
        .test_type("Suite")
        .provider_fn("letters", move || {
            calls.set(calls.get() + 1);
            Ok(Some(rows![["a"], ["b"], ["c"]]))
        })
        .parameterized("testLetter", "letters", |_| Ok(()))
        .plain("testPlain", || Ok(()));
    registry
}

fn names(runner: &mut DataProviderRunner<&SuiteRegistry>) -> Vec<String> {
    runner
        .compute_scheduled_invocations()
        .unwrap()
        .iter()
        .map(|invocation| invocation.display_name().to_string())
        .collect()
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn scheduled_list_is_computed_once() {
    let calls = Rc::new(Cell::new(0));
    let registry = counting_suite(calls.clone());
    let mut runner = DataProviderRunner::new(&registry, "Suite").unwrap();

    let first = names(&mut runner);
    let second = names(&mut runner);
    assert_eq!(first, second);
    assert_eq!(first, vec!["testLetter[1: a]", "testLetter[2: b]", "testLetter[3: c]", "testPlain"]);
    assert_eq!(calls.get(), 1);

    runner.run(&mut SilentListener).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn base_name_filter_keeps_the_whole_group() {
    let registry = counting_suite(Rc::default());
    let mut runner = DataProviderRunner::new(&registry, "Suite").unwrap();
    runner.filter(&MethodFilter::new("testLetter")).unwrap();
    assert_eq!(names(&mut runner).len(), 3);
    assert_eq!(runner.tracker().scheduled(&TestId::new("Suite", "testLetter")), Some(3));
}

#[test]
fn display_name_filter_keeps_one_invocation() {
    let registry = counting_suite(Rc::default());
    let mut runner = DataProviderRunner::new(&registry, "Suite").unwrap();
    runner.filter(&MethodFilter::new("testLetter[2: b]").in_type("Suite")).unwrap();
    assert_eq!(names(&mut runner), vec!["testLetter[2: b]"]);
    assert_eq!(runner.tracker().scheduled(&TestId::new("Suite", "testLetter")), Some(1));
}

#[test]
fn closures_are_filters() {
    let registry = counting_suite(Rc::default());
    let mut runner = DataProviderRunner::new(&registry, "Suite").unwrap();
    let not_b = |description: &Description| !description.display_name.ends_with("b]");
    runner.filter(&not_b).unwrap();
    assert_eq!(names(&mut runner), vec!["testLetter[1: a]", "testLetter[3: c]", "testPlain"]);
}

#[test]
fn filter_in_other_type_selects_nothing() {
    let registry = counting_suite(Rc::default());
    let mut runner = DataProviderRunner::new(&registry, "Suite").unwrap();
    let err = runner
        .filter(&MethodFilter::new("testLetter").in_type("Elsewhere"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No tests remain after applying filter: Method testLetter(Elsewhere)"
    );
    assert!(runner.compute_scheduled_invocations().unwrap().is_empty());
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn every_configuration_error_is_reported_before_running() {
    let ran = Rc::new(Cell::new(false));
    let ran_in_body = ran.clone();
    let mut registry = SuiteRegistry::new();
    registry
        .test_type("Broken")
        .provider_method(
            "hidden",
            MethodSignature {
                visibility: Visibility::Private,
                is_static: false,
                ..MethodSignature::default()
            },
            || Ok(Some(rows![[1]])),
        )
        .provider_method(
            "flat",
            MethodSignature {
                return_shape: ReturnShape::Other("Vec<i64>".to_string()),
                ..MethodSignature::default()
            },
            || Ok(Some(rows![[1]])),
        )
        .provider_field(
            "config",
            FieldSignature {
                visibility: Visibility::Public,
                is_static: true,
                declared_type: FieldType::Other("String".to_string()),
            },
        )
        .parameterized("usesHidden", "hidden", move |_| {
            ran_in_body.set(true);
            Ok(())
        })
        .parameterized("usesFlat", "flat", |_| Ok(()))
        .parameterized("usesConfig", "config", |_| Ok(()))
        .parameterized("usesMissing", "missing", |_| Ok(()))
        .test(TestDefinition::parameterized("Broken", "unbound", UseDataProvider::new("hidden"), 1), |_| Ok(()))
        .test(
            TestDefinition {
                parameter_count: 2,
                ..TestDefinition::plain("Broken", "takesArgs")
            },
            |_| Ok(()),
        );

    let mut runner = DataProviderRunner::new(&registry, "Broken").unwrap();
    let (test_type, errors) = match runner.run(&mut SilentListener) {
        Err(RunError::Initialization { test_type, errors }) => (test_type, errors),
        other => panic!("expected an initialization error, got {other:?}"),
    };
    assert_eq!(test_type, "Broken");

    let failing: Vec<&str> = errors.iter().map(|e| e.test().method.as_str()).collect();
    assert_eq!(failing, vec!["usesHidden", "usesFlat", "usesConfig", "usesMissing", "unbound", "takesArgs"]);
    assert!(matches!(errors[0], ConfigurationError::InvalidProviderMethod { .. }));
    assert!(errors[0].to_string().contains("must be public, must be static"));
    assert!(errors[1].to_string().contains("returns Vec<i64>"));
    assert!(matches!(errors[2], ConfigurationError::InvalidExtendedProvider { .. }));
    assert!(matches!(errors[3], ConfigurationError::NoSuchDataProvider { .. }));
    assert!(matches!(
        errors[5],
        ConfigurationError::InvalidTestSignature { parameter_count: 2, .. }
    ));
    assert!(!ran.get());
}

#[test]
fn provider_on_another_type_is_resolved() {
    let mut registry = SuiteRegistry::new();
    registry
        .test_type("Shared")
        .provider_fn("primes", || Ok(Some(rows![[2], [3], [5]])));
    registry.test_type("Consumer").parameterized_with(
        "isPrime",
        UseDataProvider::new("primes").with_location("Shared"),
        |row| match row[0].as_int() {
            Some(2 | 3 | 5) => Ok(()),
            other => Err(format!("{other:?} is not prime").into()),
        },
    );

    let mut runner = DataProviderRunner::new(&registry, "Consumer").unwrap();
    assert!(runner.validate_configuration().is_empty());
    let summary = runner.run(&mut SilentListener).unwrap();
    assert_eq!(summary.passed, 3);
}

#[test]
fn provider_missing_from_named_location_is_reported() {
    let mut registry = SuiteRegistry::new();
    registry
        .test_type("Consumer")
        .provider_fn("primes", || Ok(Some(rows![[2]])))
        .parameterized_with("isPrime", UseDataProvider::new("primes").with_location("Shared"), |_| Ok(()));

    let runner = DataProviderRunner::new(&registry, "Consumer").unwrap();
    let errors = runner.validate_configuration();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "No such data provider: primes (used by `Consumer.isPrime`, looked up on `Shared`)"
    );
}

// ============================================================================
// Expansion failures
// ============================================================================

fn expansion_error(provider: impl Fn() -> dataprovider::ProviderResult + 'static) -> ExpansionError {
    let mut registry = SuiteRegistry::new();
    registry
        .test_type("Suite")
        .provider_fn("rows", provider)
        .parameterized("testRows", "rows", |_| Ok(()));
    let mut runner = DataProviderRunner::new(&registry, "Suite").unwrap();
    match runner.run(&mut SilentListener) {
        Err(RunError::Expansion(err)) => err,
        other => panic!("expected an expansion error, got {other:?}"),
    }
}

#[test]
fn null_result_fails_the_run() {
    let err = expansion_error(|| Ok(None));
    assert!(matches!(err, ExpansionError::NullResult { .. }));
    assert_eq!(err.to_string(), "Data provider 'rows' must not return null (used by `Suite.testRows`)");
}

#[test]
fn empty_result_fails_the_run() {
    let err = expansion_error(|| Ok(Some(Vec::new())));
    assert!(matches!(err, ExpansionError::NoRows { .. }));
}

#[test]
fn provider_error_is_wrapped() {
    let err = expansion_error(|| Err("database offline".into()));
    assert_eq!(
        err.to_string(),
        "Exception while exploding test method `Suite.testRows` using data provider 'rows': database offline"
    );
    assert_eq!(err.provider(), "rows");
}

#[test]
fn empty_row_fails_the_run() {
    let err = expansion_error(|| {
        let mut rows = rows![[1], [2]];
        rows.push(dataprovider::ParameterRow::new(Vec::new()));
        Ok(Some(rows))
    });
    assert!(matches!(err, ExpansionError::EmptyRow { index: 3, .. }));
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn stop_on_fail_counts_the_rest_as_not_run() {
    let mut registry = SuiteRegistry::new();
    registry
        .test_type("Suite")
        .provider_fn("numbers", || Ok(Some(rows![[1], [2], [3], [4]])))
        .parameterized("testEven", "numbers", |row| match row[0].as_int() {
            Some(n) if n % 2 == 0 => Ok(()),
            _ => Err("odd".into()),
        });

    let mut runner = DataProviderRunner::new(&registry, "Suite")
        .unwrap()
        .with_config(RunConfig::new().with_stop_on_fail(true));
    let summary = runner.run(&mut SilentListener).unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.not_run, 3);
    assert_eq!(summary.failures, vec![("testEven[1: 1]".to_string(), "odd".to_string())]);
}

#[test]
fn panicking_body_fails_only_its_invocation() {
    let mut registry = SuiteRegistry::new();
    registry
        .test_type("Suite")
        .provider_fn("numbers", || Ok(Some(rows![[1], [2]])))
        .parameterized("testPanics", "numbers", |row| {
            if row[0].as_int() == Some(1) {
                panic!("boom");
            }
            Ok(())
        });

    let mut runner = DataProviderRunner::new(&registry, "Suite").unwrap();
    let summary = runner.run(&mut SilentListener).unwrap();
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failures[0].1, "test panicked: boom");
}

// ============================================================================
// Group teardown
// ============================================================================

type Log = Rc<RefCell<Vec<String>>>;

/// Three rows; logs `provide` and every hook.
struct Connection {
    log: Log,
}

impl Connection {
    fn log(&self, entry: &str) -> Result<(), BoxError> {
        self.log.borrow_mut().push(entry.to_string());
        Ok(())
    }
}

impl ExtendedDataProvider for Connection {
    fn provide(&mut self) -> ProviderResult {
        self.log("provide")?;
        Ok(Some((1..=3).map(|i| ParameterRow::new(vec![Value::Int(i)])).collect()))
    }

    fn before_all(&mut self) -> Result<(), BoxError> {
        self.log("before_all")
    }

    fn after_all(&mut self) -> Result<(), BoxError> {
        self.log("after_all")
    }
}

fn connection_suite(log: &Log, failing_row: i64) -> SuiteRegistry {
    let mut registry = SuiteRegistry::new();
    let body_log = log.clone();
    registry
        .test_type("Db")
        .extended("connection", shared(Connection { log: log.clone() }))
        .parameterized("query", "connection", move |row| {
            let n = row[0].as_int().unwrap_or_default();
            body_log.borrow_mut().push(format!("body{}", n));
            if n == failing_row {
                return Err(format!("row {} failed", n).into());
            }
            Ok(())
        });
    registry
}

#[test]
fn stop_on_fail_still_tears_down_the_open_group() {
    let log: Log = Rc::default();
    let registry = connection_suite(&log, 1);
    let mut runner = DataProviderRunner::new(&registry, "Db")
        .unwrap()
        .with_config(RunConfig::new().with_stop_on_fail(true));
    let summary = runner.run(&mut SilentListener).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.not_run, 2);
    assert_eq!(*log.borrow(), vec!["provide", "before_all", "body1", "after_all"]);
}

#[test]
fn stop_on_fail_at_the_last_member_tears_down_once() {
    let log: Log = Rc::default();
    let registry = connection_suite(&log, 3);
    let mut runner = DataProviderRunner::new(&registry, "Db")
        .unwrap()
        .with_config(RunConfig::new().with_stop_on_fail(true));
    runner.run(&mut SilentListener).unwrap();

    assert_eq!(log.borrow().iter().filter(|entry| *entry == "after_all").count(), 1);
}

/// Delegates to a registry but refuses to wrap one row.
struct Refusing {
    inner: SuiteRegistry,
    refused: i64,
}

impl TestHost for Refusing {
    fn discover_candidate_tests(&self, test_type: &str) -> Result<Vec<TestDefinition>, HostError> {
        self.inner.discover_candidate_tests(test_type)
    }

    fn resolve_data_sources(&self, location: &str) -> Vec<DataSourceCandidate> {
        self.inner.resolve_data_sources(location)
    }

    fn wrap_invocation(
        &self,
        test: &TestDefinition,
        row: Option<&ParameterRow>,
    ) -> Result<Box<dyn Statement>, HostError> {
        if row.and_then(|row| row[0].as_int()) == Some(self.refused) {
            return Err(HostError::MissingBody(test.id.clone()));
        }
        self.inner.wrap_invocation(test, row)
    }
}

#[derive(Default)]
struct Outcomes {
    results: Vec<(String, bool)>,
    completed: usize,
}

impl RunListener for Outcomes {
    fn on_invocation_start(&mut self, _invocation: &Invocation) {}

    fn on_invocation_complete(&mut self, invocation: &Invocation, result: &InvocationResult) {
        self.results.push((invocation.display_name().to_string(), result.is_passed()));
    }

    fn on_run_complete(&mut self, _summary: &RunSummary) {
        self.completed += 1;
    }
}

#[test]
fn host_failure_fails_only_its_invocation() {
    let log: Log = Rc::default();
    let host = Refusing {
        inner: connection_suite(&log, 0),
        refused: 2,
    };
    let mut runner = DataProviderRunner::new(host, "Db").unwrap();
    let mut outcomes = Outcomes::default();
    let summary = runner.run(&mut outcomes).unwrap();

    assert_eq!(
        outcomes.results,
        vec![
            ("query[1: 1]".to_string(), true),
            ("query[2: 2]".to_string(), false),
            ("query[3: 3]".to_string(), true),
        ]
    );
    assert_eq!(outcomes.completed, 1);
    assert_eq!(summary.failures[0].1, "no test body registered for `Db.query`");
    assert_eq!(
        *log.borrow(),
        vec!["provide", "before_all", "body1", "body3", "after_all"]
    );
}
