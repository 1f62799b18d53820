use std::{
    cmp::Ordering,
    collections::BTreeMap,
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering::SeqCst},
        Arc,
    },
};

use jobwire::{
    container::Lifecycle,
    install_adapters,
    proxy::{
        CombinerProxy, InputFormatProxy, MapperProxy, PartitionerProxy, ReducerProxy, SortComparatorProxy,
    },
    BridgeError, Compare, Component, ComponentClass, ConfigurationContext, ConfigurationDefinition, Emitter, Hooks,
    Map, Partition, Reduce, Registry, Role, SplitSource, RECORD_READER_CLASS,
};
use jobwire_host::{
    catalog::NativeCatalog,
    job,
    native::{InputFormat, Mapper, Partitioner, RawComparator, RecordReader, Reducer},
    BoxError, Configuration, Datum, DatumType, InputSplit, JobContext, TaskAttemptId, TaskContext, TaskError,
    TaskKind,
};
use serde_json::{json, Value};

#[derive(Default)]
struct Counters {
    constructed: AtomicUsize,
    setup: AtomicUsize,
    cleanup: AtomicUsize,
    calls: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> (usize, usize, usize, usize) {
        (
            self.constructed.load(SeqCst),
            self.setup.load(SeqCst),
            self.cleanup.load(SeqCst),
            self.calls.load(SeqCst),
        )
    }
}

#[derive(Debug)]
struct Rejected(String);

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected {}", self.0)
    }
}

impl Error for Rejected {}

/// Splits lines into words, fails on the line `bad`.
struct WordMapper {
    counters: Arc<Counters>,
    hooks: Hooks,
    fail_setup: bool,
}

impl Component for WordMapper {
    fn hooks(&self) -> Hooks {
        self.hooks
    }

    fn setup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        self.counters.setup.fetch_add(1, SeqCst);
        if self.fail_setup {
            return Err(Rejected("setup".to_string()).into());
        }
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        self.counters.cleanup.fetch_add(1, SeqCst);
        Ok(())
    }
}

impl Map for WordMapper {
    fn map(&mut self, _key: Value, value: Value, out: &mut Emitter) -> Result<(), BoxError> {
        self.counters.calls.fetch_add(1, SeqCst);
        let line = value.as_str().unwrap_or_default();
        if line == "bad" {
            return Err(Rejected(line.to_string()).into());
        }
        for word in line.split_whitespace() {
            out.emit(word, 1);
        }
        Ok(())
    }
}

#[derive(Default)]
struct SumReducer;

impl Component for SumReducer {}

impl Reduce for SumReducer {
    fn reduce(
        &mut self,
        key: Value,
        values: &mut dyn Iterator<Item = Value>,
        out: &mut Emitter,
    ) -> Result<(), BoxError> {
        let total = values.map(|value| value.as_i64().unwrap_or_default()).sum::<i64>();
        out.emit(key, total);
        Ok(())
    }
}

struct FirstLetterPartitioner {
    counters: Arc<Counters>,
}

impl Component for FirstLetterPartitioner {
    fn hooks(&self) -> Hooks {
        Hooks::SETUP
    }

    fn setup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        self.counters.setup.fetch_add(1, SeqCst);
        Ok(())
    }
}

impl Partition for FirstLetterPartitioner {
    fn partition(&mut self, key: &Value, _value: &Value, num_partitions: u32) -> Result<u32, BoxError> {
        self.counters.calls.fetch_add(1, SeqCst);
        let first = key.as_str().and_then(|s| s.bytes().next()).unwrap_or_default();
        Ok(first as u32 % num_partitions)
    }
}

struct ReverseComparator {
    counters: Arc<Counters>,
}

impl Component for ReverseComparator {
    fn hooks(&self) -> Hooks {
        Hooks::CLEANUP
    }

    fn cleanup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        self.counters.cleanup.fetch_add(1, SeqCst);
        Ok(())
    }
}

impl Compare for ReverseComparator {
    fn compare(&mut self, a: &Value, b: &Value) -> Result<Ordering, BoxError> {
        Ok(b.as_str().cmp(&a.as_str()))
    }
}

struct FileSplits {
    counters: Arc<Counters>,
}

impl Component for FileSplits {
    fn hooks(&self) -> Hooks {
        Hooks::ALL
    }

    fn setup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        self.counters.setup.fetch_add(1, SeqCst);
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        self.counters.cleanup.fetch_add(1, SeqCst);
        Ok(())
    }
}

impl SplitSource for FileSplits {
    fn get_splits(&mut self, ctx: &JobContext) -> Result<Vec<Value>, BoxError> {
        Ok(ctx
            .configuration()
            .get_strings(job::INPUT_DIR)
            .into_iter()
            .enumerate()
            .map(|(i, path)| match i {
                0 => json!(path),
                _ => json!({ "path": path, "start": 10, "length": 5, "hosts": ["h1"] }),
            })
            .collect())
    }
}

/// Returns one record per split with the split path as value.
#[derive(Default)]
struct PathReader {
    path: Option<String>,
}

impl RecordReader for PathReader {
    fn initialize(&mut self, split: &InputSplit, _ctx: &TaskContext) -> Result<(), TaskError> {
        self.path = split.path.clone();
        Ok(())
    }

    fn next_key_value(&mut self) -> Result<Option<(Datum, Datum)>, TaskError> {
        Ok(self.path.take().map(|path| (Datum::Long(0), Datum::Text(path))))
    }
}

/// Reads records from memory.
struct VecReader(std::vec::IntoIter<(Datum, Datum)>);

impl RecordReader for VecReader {
    fn initialize(&mut self, _split: &InputSplit, _ctx: &TaskContext) -> Result<(), TaskError> {
        Ok(())
    }

    fn next_key_value(&mut self) -> Result<Option<(Datum, Datum)>, TaskError> {
        Ok(self.0.next())
    }
}

fn test_registry(counters: &Arc<Counters>, hooks: Hooks, fail_setup: bool) -> Arc<Registry> {
    let mut registry = Registry::new();
    let c = counters.clone();
    registry.register_mapper_with(ComponentClass::of::<WordMapper>().name(), move || {
        c.constructed.fetch_add(1, SeqCst);
        Box::new(WordMapper {
            counters: c.clone(),
            hooks,
            fail_setup,
        })
    });
    let c = counters.clone();
    registry.register_partitioner_with(ComponentClass::of::<FirstLetterPartitioner>().name(), move || {
        c.constructed.fetch_add(1, SeqCst);
        Box::new(FirstLetterPartitioner { counters: c.clone() })
    });
    let c = counters.clone();
    registry.register_comparator_with(ComponentClass::of::<ReverseComparator>().name(), move || {
        c.constructed.fetch_add(1, SeqCst);
        Box::new(ReverseComparator { counters: c.clone() })
    });
    let c = counters.clone();
    registry.register_split_source_with(ComponentClass::of::<FileSplits>().name(), move || {
        c.constructed.fetch_add(1, SeqCst);
        Box::new(FileSplits { counters: c.clone() })
    });
    registry
        .register_reducer::<SumReducer>()
        .register_record_reader::<PathReader>();
    Arc::new(registry)
}

fn task_context(entries: &[(&str, &str)], kind: TaskKind) -> TaskContext {
    let configuration = entries.iter().copied().collect::<Configuration>();
    TaskContext::new(Arc::new(configuration), TaskAttemptId::new("test", kind, 0, 0))
}

fn bridge_error(err: &TaskError) -> &BridgeError {
    err.source()
        .and_then(|source| source.downcast_ref::<BridgeError>())
        .expect("task error is caused by bridge error")
}

#[test]
fn mapper_resolves_once() {
    let counters = Arc::new(Counters::default());
    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::ALL, false));
    let name = ComponentClass::of::<WordMapper>();
    let mut ctx = task_context(&[("mapper_class", name.name())], TaskKind::Map);
    assert_eq!(proxy.container().lifecycle(), Lifecycle::Unresolved);

    for line in ["a b", "c", "d e f"] {
        proxy.map(Datum::Long(0), Datum::from(line), &mut ctx).unwrap();
    }
    assert_eq!(proxy.container().lifecycle(), Lifecycle::Active);
    assert_eq!(proxy.container().hooks(), Some((true, true)));
    assert_eq!(counters.snapshot(), (1, 1, 0, 3));
    assert_eq!(ctx.output().len(), 6);
    assert_eq!(ctx.output()[0], (Datum::from("a"), Datum::Long(1)));

    proxy.cleanup(&mut ctx).unwrap();
    proxy.cleanup(&mut ctx).unwrap();
    assert_eq!(counters.snapshot(), (1, 1, 1, 3));
    assert_eq!(proxy.container().lifecycle(), Lifecycle::Finalized);

    let err = proxy.map(Datum::Long(0), Datum::from("g"), &mut ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::Finalized { role: Role::Mapper, .. }));
    assert_eq!(counters.snapshot(), (1, 1, 1, 3));
}

#[test]
fn undeclared_hooks_are_not_called() {
    let counters = Arc::new(Counters::default());
    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::NONE, false));
    let name = ComponentClass::of::<WordMapper>();
    let mut ctx = task_context(&[("mapper_class", name.name())], TaskKind::Map);

    proxy.map(Datum::Long(0), Datum::from("x"), &mut ctx).unwrap();
    proxy.map(Datum::Long(1), Datum::from("y"), &mut ctx).unwrap();
    assert_eq!(proxy.container().hooks(), Some((false, false)));
    proxy.cleanup(&mut ctx).unwrap();
    assert_eq!(counters.snapshot(), (1, 0, 0, 2));
}

#[test]
fn cleanup_without_invocation() {
    let counters = Arc::new(Counters::default());
    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::ALL, false));
    let mut ctx = task_context(&[], TaskKind::Map);
    proxy.cleanup(&mut ctx).unwrap();
    assert_eq!(counters.snapshot(), (0, 0, 0, 0));
    assert_eq!(proxy.container().lifecycle(), Lifecycle::Finalized);
}

#[test]
fn output_follows_declared_classes() {
    let counters = Arc::new(Counters::default());
    let name = ComponentClass::of::<WordMapper>();

    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::NONE, false));
    let mut ctx = task_context(
        &[
            ("mapper_class", name.name()),
            (job::OUTPUT_KEY_CLASS, "text"),
            (job::MAP_OUTPUT_VALUE_CLASS, "int"),
        ],
        TaskKind::Map,
    );
    proxy.map(Datum::Long(0), Datum::from("w"), &mut ctx).unwrap();
    assert_eq!(ctx.take_output(), vec![(Datum::from("w"), Datum::Int(1))]);

    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::NONE, false));
    let mut ctx = task_context(
        &[("mapper_class", name.name()), (job::MAP_OUTPUT_VALUE_CLASS, "boolean")],
        TaskKind::Map,
    );
    let err = proxy.map(Datum::Long(0), Datum::from("w"), &mut ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::Conversion { role: Role::Mapper, .. }));

    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::NONE, false));
    let mut ctx = task_context(
        &[("mapper_class", name.name()), (job::MAP_OUTPUT_KEY_CLASS, "varchar")],
        TaskKind::Map,
    );
    let err = proxy.map(Datum::Long(0), Datum::from("w"), &mut ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::Configuration { role: Role::Mapper, .. }));
}

#[test]
fn missing_and_unknown_classes() {
    let counters = Arc::new(Counters::default());

    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::ALL, false));
    let mut ctx = task_context(&[], TaskKind::Map);
    let err = proxy.map(Datum::Null, Datum::from("a"), &mut ctx).unwrap_err();
    match bridge_error(&err) {
        BridgeError::ClassResolution { role, key, class, .. } => {
            assert_eq!(*role, Role::Mapper);
            assert_eq!(*key, "mapper_class");
            assert_eq!(*class, None);
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(err.attempt(), ctx.attempt());
    assert_eq!(proxy.container().lifecycle(), Lifecycle::Finalized);

    // A failed resolution is not retried within the attempt.
    let err = proxy.map(Datum::Null, Datum::from("a"), &mut ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::Finalized { .. }));

    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::ALL, false));
    let mut ctx = task_context(&[("mapper_class", "missing::Mapper")], TaskKind::Map);
    let err = proxy.map(Datum::Null, Datum::from("a"), &mut ctx).unwrap_err();
    assert!(matches!(
        bridge_error(&err),
        BridgeError::ClassResolution { class: Some(class), .. } if class == "missing::Mapper"
    ));
    assert!(err.to_string().contains("attempt_test_m_000000_0"));
    assert_eq!(counters.snapshot(), (0, 0, 0, 0));
}

#[test]
fn delegate_errors_keep_cause() {
    let counters = Arc::new(Counters::default());
    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::NONE, false));
    let name = ComponentClass::of::<WordMapper>();
    let mut ctx = task_context(&[("mapper_class", name.name())], TaskKind::Map);

    let err = proxy.map(Datum::Long(0), Datum::from("bad"), &mut ctx).unwrap_err();
    let bridge = bridge_error(&err);
    assert!(matches!(
        bridge,
        BridgeError::DelegateInvocation {
            role: Role::Mapper,
            operation: "map",
            ..
        }
    ));
    assert_eq!(bridge.attempt(), ctx.attempt());
    let cause = bridge.source().unwrap();
    assert_eq!(cause.to_string(), "rejected bad");
    assert!(cause.downcast_ref::<Rejected>().is_some());
    assert_eq!(err.message(), "mapper map failed in attempt_test_m_000000_0: rejected bad");

    // The component stays usable after a failed record.
    proxy.map(Datum::Long(1), Datum::from("fine"), &mut ctx).unwrap();
    assert_eq!(counters.snapshot(), (1, 0, 0, 2));
}

#[test]
fn failed_setup() {
    let counters = Arc::new(Counters::default());
    let mut proxy = MapperProxy::new(test_registry(&counters, Hooks::ALL, true));
    let name = ComponentClass::of::<WordMapper>();
    let mut ctx = task_context(&[("mapper_class", name.name())], TaskKind::Map);

    let err = proxy.map(Datum::Long(0), Datum::from("a"), &mut ctx).unwrap_err();
    assert!(matches!(
        bridge_error(&err),
        BridgeError::DelegateInvocation { operation: "setup", .. }
    ));
    proxy.cleanup(&mut ctx).unwrap();
    assert_eq!(counters.snapshot(), (1, 1, 0, 0));
}

#[test]
fn reducer_and_combiner_output_classes() {
    let counters = Arc::new(Counters::default());
    let registry = test_registry(&counters, Hooks::NONE, false);
    let name = ComponentClass::of::<SumReducer>();
    let entries = [
        ("reducer_class", name.name()),
        ("combiner_class", name.name()),
        (job::MAP_OUTPUT_VALUE_CLASS, "int"),
        (job::OUTPUT_VALUE_CLASS, "double"),
    ];

    let mut reducer = ReducerProxy::new(registry.clone());
    let mut ctx = task_context(&entries, TaskKind::Reduce);
    let mut values = vec![Datum::Long(2), Datum::Int(3)].into_iter();
    reducer.reduce(Datum::from("w"), &mut values, &mut ctx).unwrap();
    assert_eq!(ctx.take_output(), vec![(Datum::from("w"), Datum::Double(5.0))]);
    reducer.cleanup(&mut ctx).unwrap();

    let mut combiner = CombinerProxy::new(registry);
    let mut ctx = task_context(&entries, TaskKind::Map);
    let mut values = vec![Datum::Long(1), Datum::Long(1)].into_iter();
    combiner.reduce(Datum::from("w"), &mut values, &mut ctx).unwrap();
    assert_eq!(ctx.take_output(), vec![(Datum::from("w"), Datum::Int(2))]);
    assert_eq!(combiner.container().lifecycle(), Lifecycle::Active);
}

#[test]
fn concurrent_first_calls_resolve_once() {
    let counters = Arc::new(Counters::default());
    let proxy = PartitionerProxy::new(test_registry(&counters, Hooks::NONE, false));
    let name = ComponentClass::of::<FirstLetterPartitioner>();
    let ctx = task_context(&[("partitioner_class", name.name())], TaskKind::Map);

    let partitions = std::thread::scope(|s| {
        let handles = (0..8)
            .map(|i| {
                let (proxy, ctx) = (&proxy, &ctx);
                s.spawn(move || {
                    let key = Datum::from(if i % 2 == 0 { "a" } else { "b" });
                    proxy.get_partition(&key, &Datum::Long(1), 4, ctx).unwrap()
                })
            })
            .collect::<Vec<_>>();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
    });

    assert_eq!(partitions, vec![1, 2, 1, 2, 1, 2, 1, 2]);
    assert_eq!(counters.snapshot(), (1, 1, 0, 8));
    proxy.close(&ctx).unwrap();
    assert_eq!(proxy.container().lifecycle(), Lifecycle::Finalized);
}

#[test]
fn comparator_cleanup_on_close() {
    let counters = Arc::new(Counters::default());
    let proxy = SortComparatorProxy::new(test_registry(&counters, Hooks::NONE, false));
    let name = ComponentClass::of::<ReverseComparator>();
    let ctx = task_context(&[("sort_comparator_class", name.name())], TaskKind::Reduce);

    let mut keys = vec![Datum::from("b"), Datum::from("c"), Datum::from("a")];
    keys.sort_by(|a, b| proxy.compare(a, b, &ctx).unwrap());
    assert_eq!(keys, vec![Datum::from("c"), Datum::from("b"), Datum::from("a")]);

    proxy.close(&ctx).unwrap();
    proxy.close(&ctx).unwrap();
    assert_eq!(counters.snapshot(), (1, 0, 1, 0));
}

#[test]
fn input_format_splits_and_readers() {
    let counters = Arc::new(Counters::default());
    let registry = test_registry(&counters, Hooks::NONE, false);
    let source = ComponentClass::of::<FileSplits>();
    let reader = ComponentClass::of::<PathReader>();
    let configuration = Arc::new(
        [
            ("input_format_class", source.name()),
            (RECORD_READER_CLASS, reader.name()),
            (job::INPUT_DIR, "a.txt,b.txt"),
        ]
        .into_iter()
        .collect::<Configuration>(),
    );

    let mut proxy = InputFormatProxy::new(registry.clone());
    let job_ctx = JobContext::new(configuration.clone());
    let splits = proxy.get_splits(&job_ctx).unwrap();
    assert_eq!(
        splits,
        vec![
            InputSplit {
                path: Some("a.txt".to_string()),
                start: 0,
                length: 0,
                hosts: Vec::new(),
            },
            InputSplit {
                path: Some("b.txt".to_string()),
                start: 10,
                length: 5,
                hosts: vec!["h1".to_string()],
            },
        ]
    );
    proxy.cleanup(&job_ctx).unwrap();
    assert_eq!(counters.snapshot(), (1, 1, 1, 0));

    let ctx = TaskContext::new(configuration, TaskAttemptId::new("test", TaskKind::Map, 1, 0));
    let proxy = InputFormatProxy::new(registry.clone());
    for split in &splits {
        let mut reader = proxy.create_record_reader(split, &ctx).unwrap();
        reader.initialize(split, &ctx).unwrap();
        assert_eq!(
            reader.next_key_value().unwrap(),
            Some((Datum::Long(0), Datum::Text(split.path.clone().unwrap())))
        );
        assert_eq!(reader.next_key_value().unwrap(), None);
        reader.close().unwrap();
    }
    assert_eq!(proxy.container().lifecycle(), Lifecycle::Unresolved);

    let ctx = task_context(&[("input_format_class", source.name())], TaskKind::Map);
    let err = proxy.create_record_reader(&splits[0], &ctx).err().unwrap();
    assert!(matches!(
        bridge_error(&err),
        BridgeError::ClassResolution {
            role: Role::InputFormat,
            key: RECORD_READER_CLASS,
            class: None,
            ..
        }
    ));
}

#[test]
fn invalid_split() {
    struct NumberSplits;

    impl Component for NumberSplits {}

    impl SplitSource for NumberSplits {
        fn get_splits(&mut self, _ctx: &JobContext) -> Result<Vec<Value>, BoxError> {
            Ok(vec![json!(42)])
        }
    }

    let mut registry = Registry::new();
    registry.register_split_source_with("NumberSplits", || Box::new(NumberSplits));
    let mut proxy = InputFormatProxy::new(Arc::new(registry));
    let ctx = JobContext::new(Arc::new([("input_format_class", "NumberSplits")].into_iter().collect()));
    let err = proxy.get_splits(&ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::Conversion { role: Role::InputFormat, .. }));
    assert_eq!(err.attempt(), None);
}

/// Emits every token with its number, fails after emitting when a token is `bad`.
struct NumberMapper;

impl Component for NumberMapper {}

impl Map for NumberMapper {
    fn map(&mut self, _key: Value, value: Value, out: &mut Emitter) -> Result<(), BoxError> {
        let line = value.as_str().unwrap_or_default();
        for token in line.split_whitespace() {
            match token.parse::<i64>() {
                Ok(number) => out.emit(token, number),
                Err(_) => out.emit(token, token),
            }
        }
        if line.split_whitespace().any(|token| token == "bad") {
            return Err(Rejected(line.to_string()).into());
        }
        Ok(())
    }
}

/// Emits the sum of values, fails after emitting when the key is `bad`.
struct StrictSumReducer;

impl Component for StrictSumReducer {}

impl Reduce for StrictSumReducer {
    fn reduce(
        &mut self,
        key: Value,
        values: &mut dyn Iterator<Item = Value>,
        out: &mut Emitter,
    ) -> Result<(), BoxError> {
        let total = values.map(|value| value.as_i64().unwrap_or_default()).sum::<i64>();
        out.emit(key.clone(), total);
        if key == "bad" {
            return Err(Rejected("bad".to_string()).into());
        }
        Ok(())
    }
}

#[test]
fn failed_calls_write_nothing() {
    let mut registry = Registry::new();
    registry
        .register_mapper_with("NumberMapper", || Box::new(NumberMapper))
        .register_reducer_with("StrictSumReducer", || Box::new(StrictSumReducer));
    let registry = Arc::new(registry);

    let mut mapper = MapperProxy::new(registry.clone());
    let mut ctx = task_context(
        &[("mapper_class", "NumberMapper"), (job::MAP_OUTPUT_VALUE_CLASS, "long")],
        TaskKind::Map,
    );
    let err = mapper.map(Datum::Long(0), Datum::from("1 bad"), &mut ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::DelegateInvocation { operation: "map", .. }));
    assert!(ctx.output().is_empty());

    // "x" is not a long, so "2" is not written either.
    let err = mapper.map(Datum::Long(1), Datum::from("2 x"), &mut ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::Conversion { role: Role::Mapper, .. }));
    assert!(ctx.output().is_empty());

    mapper.map(Datum::Long(2), Datum::from("3"), &mut ctx).unwrap();
    assert_eq!(ctx.take_output(), vec![(Datum::from("3"), Datum::Long(3))]);

    let mut reducer = ReducerProxy::new(registry);
    let mut ctx = task_context(
        &[("reducer_class", "StrictSumReducer"), (job::OUTPUT_VALUE_CLASS, "long")],
        TaskKind::Reduce,
    );
    let mut values = vec![Datum::Long(1), Datum::Long(2)].into_iter();
    let err = reducer.reduce(Datum::from("bad"), &mut values, &mut ctx).unwrap_err();
    assert!(matches!(bridge_error(&err), BridgeError::DelegateInvocation { operation: "reduce", .. }));
    assert!(ctx.output().is_empty());

    let mut values = vec![Datum::Long(4)].into_iter();
    reducer.reduce(Datum::from("good"), &mut values, &mut ctx).unwrap();
    assert_eq!(ctx.take_output(), vec![(Datum::from("good"), Datum::Long(4))]);
}

#[test]
fn partition_out_of_range() {
    struct FixedPartitioner(u32);

    impl Component for FixedPartitioner {}

    impl Partition for FixedPartitioner {
        fn partition(&mut self, _key: &Value, _value: &Value, _num_partitions: u32) -> Result<u32, BoxError> {
            Ok(self.0)
        }
    }

    let mut registry = Registry::new();
    registry.register_partitioner_with("FixedPartitioner", || Box::new(FixedPartitioner(7)));
    let proxy = PartitionerProxy::new(Arc::new(registry));
    let ctx = task_context(&[("partitioner_class", "FixedPartitioner")], TaskKind::Map);

    assert_eq!(proxy.get_partition(&Datum::from("a"), &Datum::Long(1), 8, &ctx).unwrap(), 7);
    let err = proxy.get_partition(&Datum::from("a"), &Datum::Long(1), 3, &ctx).unwrap_err();
    match bridge_error(&err) {
        BridgeError::Conversion { role, message, .. } => {
            assert_eq!(*role, Role::Partitioner);
            assert!(message.contains("partition 7 not in 0..3"), "{message}");
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(err.attempt(), ctx.attempt());
}

#[test]
fn word_count_through_catalog() {
    let counters = Arc::new(Counters::default());
    let registry = test_registry(&counters, Hooks::ALL, false);
    let mut catalog = NativeCatalog::new();
    install_adapters(&mut catalog, registry);

    let mut context = ConfigurationContext::new(Configuration::new(), vec!["in".to_string(), "out".to_string()]);
    ConfigurationDefinition::new(Some(&mut context), |definition, arguments| {
        definition.job("wordcount", |job| {
            job.input(arguments[0].as_str(), "text")?
                .output(Some(arguments[1].as_str()), "text")?
                .mapper(ComponentClass::of::<WordMapper>())?
                .combiner(ComponentClass::of::<SumReducer>())?
                .reducer(ComponentClass::of::<SumReducer>())?
                .output_key(DatumType::Text)
                .output_value(DatumType::Long);
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();

    let shipped = context.jobs()[0].borrow().job().configuration().to_yaml().unwrap();
    let configuration = Arc::new(Configuration::from_yaml(&shipped).unwrap());
    let mapper_class = configuration.get(job::MAPPER_CLASS).unwrap();
    let reducer_class = configuration.get(job::REDUCER_CLASS).unwrap();

    let mut map_ctx = TaskContext::new(configuration.clone(), TaskAttemptId::new("wordcount", TaskKind::Map, 0, 0));
    let mut reader = VecReader(
        vec![
            (Datum::Long(0), Datum::from("to be or")),
            (Datum::Long(9), Datum::from("not to be")),
        ]
        .into_iter(),
    );
    let mut mapper = catalog.new_mapper(mapper_class).unwrap();
    mapper.run(&mut reader, &mut map_ctx).unwrap();

    let mut groups = BTreeMap::<String, Vec<Datum>>::new();
    for (key, value) in map_ctx.take_output() {
        if let Datum::Text(word) = key {
            groups.entry(word).or_default().push(value);
        }
    }

    let mut reduce_ctx =
        TaskContext::new(configuration.clone(), TaskAttemptId::new("wordcount", TaskKind::Reduce, 0, 0));
    let mut reducer = catalog.new_reducer(reducer_class).unwrap();
    for (word, values) in groups {
        reducer.reduce(Datum::Text(word), &mut values.into_iter(), &mut reduce_ctx).unwrap();
    }
    reducer.cleanup(&mut reduce_ctx).unwrap();

    assert_eq!(
        reduce_ctx.take_output(),
        vec![
            (Datum::from("be"), Datum::Long(2)),
            (Datum::from("not"), Datum::Long(1)),
            (Datum::from("or"), Datum::Long(1)),
            (Datum::from("to"), Datum::Long(2)),
        ]
    );
    assert_eq!(counters.snapshot(), (1, 1, 1, 2));
}
