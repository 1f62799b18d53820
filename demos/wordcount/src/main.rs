use std::{
    cmp::Ordering,
    io::Write,
    path::Path,
    sync::{mpsc, Arc},
};

use env_logger::Builder;
use log::{info, warn};
use serde_json::Value;
use threadpool::ThreadPool;

use jobwire::{
    install_adapters, Compare, Component, ComponentClass, ConfigurationContext, ConfigurationDefinition, Emitter,
    Hooks, Map, Partition, Reduce, Registry, SplitSource,
};
use jobwire_host::{
    catalog::NativeCatalog,
    client::JobClient,
    error_chain,
    job::{self, Job},
    native::{InputFormat, Mapper, Partitioner, RawComparator, RecordReader},
    BoxError, Configuration, Datum, DatumType, HostError, InputSplit, JobContext, TaskAttemptId, TaskContext, TaskError,
    TaskKind,
};

const MAX_ATTEMPTS: u32 = 2;

/// One split per input file.
#[derive(Default)]
struct TextFiles;

impl Component for TextFiles {}

impl SplitSource for TextFiles {
    fn get_splits(&mut self, ctx: &JobContext) -> Result<Vec<Value>, BoxError> {
        let mut splits = Vec::new();
        for dir in ctx.configuration().get_strings(job::INPUT_DIR) {
            let mut files = std::fs::read_dir(&dir)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()?;
            files.sort();
            splits.extend(files.into_iter().map(|path| Value::String(path.display().to_string())));
        }
        Ok(splits)
    }
}

/// Reads lines of a split file, keyed by line number.
#[derive(Default)]
struct LineReader {
    lines: Vec<String>,
    position: usize,
}

impl RecordReader for LineReader {
    fn initialize(&mut self, split: &InputSplit, ctx: &TaskContext) -> Result<(), TaskError> {
        let path = split
            .path
            .as_ref()
            .ok_or_else(|| TaskError::new(ctx.attempt().cloned(), "split without path"))?;
        let text = std::fs::read_to_string(path).map_err(|e| TaskError::from_source(ctx.attempt().cloned(), e))?;
        self.lines = text.lines().map(str::to_string).collect();
        self.position = 0;
        Ok(())
    }

    fn next_key_value(&mut self) -> Result<Option<(Datum, Datum)>, TaskError> {
        let record = self
            .lines
            .get(self.position)
            .map(|line| (Datum::Long(self.position as i64), Datum::Text(line.clone())));
        self.position += 1;
        Ok(record)
    }
}

/// Emits lower-cased words, skipping words listed in `wordcount.stop_words`.
#[derive(Default)]
struct WordMapper {
    stop_words: Vec<String>,
}

impl Component for WordMapper {
    fn hooks(&self) -> Hooks {
        Hooks::SETUP
    }

    fn setup(&mut self, ctx: &JobContext) -> Result<(), BoxError> {
        self.stop_words = ctx.configuration().get_strings("wordcount.stop_words");
        Ok(())
    }
}

impl Map for WordMapper {
    fn map(&mut self, _key: Value, value: Value, out: &mut Emitter) -> Result<(), BoxError> {
        let line = value.as_str().ok_or("line is not a string")?;
        for word in line.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let word = word.to_lowercase();
            if !self.stop_words.contains(&word) {
                out.emit(word, 1);
            }
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
        let mut total = 0;
        for value in values {
            total += value.as_i64().ok_or("count is not an integer")?;
        }
        out.emit(key, total);
        Ok(())
    }
}

#[derive(Default)]
struct FirstLetterPartitioner;

impl Component for FirstLetterPartitioner {}

impl Partition for FirstLetterPartitioner {
    fn partition(&mut self, key: &Value, _value: &Value, num_partitions: u32) -> Result<u32, BoxError> {
        let first = key.as_str().and_then(|word| word.chars().next()).unwrap_or_default();
        Ok(first as u32 % num_partitions)
    }
}

#[derive(Default)]
struct WordComparator;

impl Component for WordComparator {}

impl Compare for WordComparator {
    fn compare(&mut self, a: &Value, b: &Value) -> Result<Ordering, BoxError> {
        Ok(a.as_str().cmp(&b.as_str()))
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register_split_source::<TextFiles>()
        .register_record_reader::<LineReader>()
        .register_mapper::<WordMapper>()
        .register_reducer::<SumReducer>()
        .register_partitioner::<FirstLetterPartitioner>()
        .register_comparator::<WordComparator>();
    registry
}

/// Runs jobs on a thread pool of this process.
///
/// Tasks only receive the serialized job configuration and instantiate every class by name from the catalog.
struct LocalClient {
    catalog: NativeCatalog,
    pool: ThreadPool,
}

impl LocalClient {
    fn run_job(&self, job_name: &str, configuration: Arc<Configuration>) -> Result<(), TaskError> {
        let class = |key: &str| configuration.get(key).unwrap_or_default().to_string();
        let job_ctx = JobContext::new(configuration.clone());
        let mut input_format = self
            .catalog
            .new_input_format(&class(job::INPUT_FORMAT_CLASS))
            .map_err(|e| TaskError::from_source(None, e))?;
        let splits = input_format.get_splits(&job_ctx)?;
        input_format.cleanup(&job_ctx)?;
        let reduces = Job::from_configuration((*configuration).clone())
            .num_reduce_tasks()
            .map_err(|e| TaskError::from_source(None, e))?;
        info!("job {}: {} map tasks, {} reduce tasks", job_name, splits.len(), reduces);

        let map_tasks = splits.len();
        let (sender, receiver) = mpsc::channel();
        for (task, split) in splits.into_iter().enumerate() {
            let (catalog, configuration, sender) = (self.catalog.clone(), configuration.clone(), sender.clone());
            let job_name = job_name.to_string();
            self.pool.execute(move || {
                let result = with_attempts(|attempt| {
                    let id = TaskAttemptId::new(job_name.as_str(), TaskKind::Map, task as u32, attempt);
                    run_map(&catalog, configuration.clone(), id, &split, reduces)
                });
                sender.send(result).unwrap();
            });
        }
        drop(sender);

        let mut partitions = vec![Vec::new(); reduces as usize];
        let mut finished = 0;
        for result in receiver {
            finished += 1;
            for (partition, key, value) in result? {
                partitions[partition as usize].push((key, value));
            }
        }
        check_finished("map", finished, map_tasks)?;

        let (sender, receiver) = mpsc::channel();
        for (task, records) in partitions.into_iter().enumerate() {
            let (catalog, configuration, sender) = (self.catalog.clone(), configuration.clone(), sender.clone());
            let job_name = job_name.to_string();
            self.pool.execute(move || {
                let result = with_attempts(|attempt| {
                    let id = TaskAttemptId::new(job_name.as_str(), TaskKind::Reduce, task as u32, attempt);
                    run_reduce(&catalog, configuration.clone(), id, records.clone())
                });
                sender.send((task, result)).unwrap();
            });
        }
        drop(sender);

        let mut outputs = receiver.into_iter().collect::<Vec<_>>();
        check_finished("reduce", outputs.len(), reduces as usize)?;
        outputs.sort_by_key(|(task, _)| *task);
        for (task, output) in outputs {
            for (key, value) in output? {
                info!("part-{:05}: {:?} {:?}", task, key, value);
            }
        }
        Ok(())
    }
}

impl JobClient for LocalClient {
    fn submit(&mut self, job: &Job) -> Result<bool, HostError> {
        // Tasks see the job the way it is shipped to the cluster.
        let configuration = Arc::new(Configuration::from_yaml(&job.configuration().to_yaml()?)?);
        match self.run_job(job.name(), configuration) {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!("job {} failed: {}", job.name(), error_chain(&err));
                Ok(false)
            }
        }
    }
}

/// Fails the job if some tasks ended without reporting a result.
fn check_finished(kind: &str, finished: usize, expected: usize) -> Result<(), TaskError> {
    if finished != expected {
        return Err(TaskError::new(
            None,
            format!("only {} of {} {} tasks reported a result", finished, expected, kind),
        ));
    }
    Ok(())
}

fn with_attempts<T>(mut run: impl FnMut(u32) -> Result<T, TaskError>) -> Result<T, TaskError> {
    let mut attempt = 0;
    loop {
        match run(attempt) {
            Err(err) if attempt + 1 < MAX_ATTEMPTS => {
                warn!("{}, retrying", err);
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn run_map(
    catalog: &NativeCatalog,
    configuration: Arc<Configuration>,
    attempt: TaskAttemptId,
    split: &InputSplit,
    reduces: u32,
) -> Result<Vec<(u32, Datum, Datum)>, TaskError> {
    let unknown = |e: HostError| TaskError::from_source(Some(attempt.clone()), e);
    let class = |key: &str| configuration.get(key).unwrap_or_default().to_string();
    let mut ctx = TaskContext::new(configuration.clone(), attempt.clone());

    let input_format = catalog.new_input_format(&class(job::INPUT_FORMAT_CLASS)).map_err(unknown)?;
    let mut reader = input_format.create_record_reader(split, &ctx)?;
    reader.initialize(split, &ctx)?;
    let mut mapper = catalog.new_mapper(&class(job::MAPPER_CLASS)).map_err(unknown)?;
    mapper.run(reader.as_mut(), &mut ctx)?;
    reader.close()?;

    let mut output = ctx.take_output();
    if let Some(combiner_class) = configuration.get(job::COMBINER_CLASS) {
        let mut combiner = catalog.new_reducer(combiner_class).map_err(unknown)?;
        for (key, values) in group(catalog, &configuration, &ctx, output)? {
            combiner.reduce(key, &mut values.into_iter(), &mut ctx)?;
        }
        combiner.cleanup(&mut ctx)?;
        output = ctx.take_output();
    }

    let partitioner = catalog.new_partitioner(&class(job::PARTITIONER_CLASS)).map_err(unknown)?;
    let partitioned = output
        .into_iter()
        .map(|(key, value)| Ok((partitioner.get_partition(&key, &value, reduces, &ctx)?, key, value)))
        .collect::<Result<Vec<_>, TaskError>>()?;
    partitioner.close(&ctx)?;
    info!("{} produced {} records", attempt, partitioned.len());
    Ok(partitioned)
}

fn run_reduce(
    catalog: &NativeCatalog,
    configuration: Arc<Configuration>,
    attempt: TaskAttemptId,
    records: Vec<(Datum, Datum)>,
) -> Result<Vec<(Datum, Datum)>, TaskError> {
    let mut ctx = TaskContext::new(configuration.clone(), attempt.clone());
    let mut reducer = catalog
        .new_reducer(configuration.get(job::REDUCER_CLASS).unwrap_or_default())
        .map_err(|e| TaskError::from_source(Some(attempt.clone()), e))?;
    for (key, values) in group(catalog, &configuration, &ctx, records)? {
        reducer.reduce(key, &mut values.into_iter(), &mut ctx)?;
    }
    reducer.cleanup(&mut ctx)?;
    Ok(ctx.take_output())
}

/// Sorts records with the sort comparator and groups values of equal keys.
fn group(
    catalog: &NativeCatalog,
    configuration: &Configuration,
    ctx: &TaskContext,
    mut records: Vec<(Datum, Datum)>,
) -> Result<Vec<(Datum, Vec<Datum>)>, TaskError> {
    let comparator = catalog
        .new_comparator(configuration.get(job::SORT_COMPARATOR_CLASS).unwrap_or_default())
        .map_err(|e| TaskError::from_source(ctx.attempt().cloned(), e))?;
    let mut failure = None;
    records.sort_by(|a, b| {
        comparator.compare(&a.0, &b.0, ctx).unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    if let Some(err) = failure {
        return Err(err);
    }

    let mut groups: Vec<(Datum, Vec<Datum>)> = Vec::new();
    for (key, value) in records {
        match groups.last_mut() {
            Some((last, values)) if comparator.compare(last, &key, ctx)? == Ordering::Equal => values.push(value),
            _ => groups.push((key, vec![value])),
        }
    }
    comparator.close(ctx)?;
    Ok(groups)
}

fn write_input(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join("part-0.txt"), "the quick brown fox\njumps over the lazy dog\n")?;
    std::fs::write(dir.join("part-1.txt"), "The dog barks.\nThe fox runs away, quick!\n")?;
    Ok(())
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let input = std::env::temp_dir().join("jobwire-wordcount").join("input");
    write_input(&input).expect("Can't write input files");

    // Worker side: adapters resolve components from this registry by name.
    let mut catalog = NativeCatalog::new();
    install_adapters(&mut catalog, Arc::new(registry()));

    // Driver side.
    let mut context = ConfigurationContext::new(
        Configuration::new(),
        vec![input.display().to_string(), "wordcount-output".to_string()],
    );
    ConfigurationDefinition::new(Some(&mut context), |definition, arguments| {
        definition.job("wordcount", |builder| {
            builder.input(arguments[0].as_str(), "text")?
                .input_format(ComponentClass::of::<TextFiles>())?
                .record_reader(ComponentClass::of::<LineReader>())
                .output(Some(arguments[1].as_str()), "text")?
                .mapper(ComponentClass::of::<WordMapper>())?
                .combiner(ComponentClass::of::<SumReducer>())?
                .partitioner(ComponentClass::of::<FirstLetterPartitioner>())?
                .sort_comparator(ComponentClass::of::<WordComparator>())?
                .reducer(ComponentClass::of::<SumReducer>())?
                .map_output_key(DatumType::Text)
                .map_output_value(DatumType::Long)
                .output_key(DatumType::Text)
                .output_value(DatumType::Long)
                .set("wordcount.stop_words", "the,a")
                .set(job::NUM_REDUCES, 3);
            Ok(())
        })?;
        Ok(())
    })
    .expect("Can't define jobs");

    let mut client = LocalClient {
        catalog,
        pool: ThreadPool::new(4),
    };
    context.submit_all(&mut client).expect("Job failed");
}
