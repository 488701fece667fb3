// src/feeds/load.rs

use arrow::{
    compute::concat_batches,
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Schema, SchemaRef},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::{fs, io::Cursor, path::Path, sync::Arc};
use tracing::{debug, instrument};

use super::collect::collect_csv_files;
use crate::error::{FeedError, Result};
use crate::frame::Frame;

/// Rows per Arrow batch while parsing a single fragment.
const BATCH_ROWS: usize = 8_192;

/// Collect every CSV fragment under `dir`, parse each, and concatenate them in
/// discovery order. With `dedup_on`, rows repeating an earlier row's values on
/// exactly those columns are dropped (first occurrence wins).
#[instrument(level = "debug", skip(dedup_on), fields(dir = %dir.display()))]
pub fn load_table(dir: &Path, dedup_on: Option<&[&str]>) -> Result<Frame> {
    let feed = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string());

    let files = collect_csv_files(dir)?;
    if files.is_empty() {
        return Err(FeedError::FeedLoad {
            feed,
            reason: format!("no CSV fragments to concatenate under {}", dir.display()),
        });
    }

    let mut schema: Option<SchemaRef> = None;
    let mut batches = Vec::with_capacity(files.len());
    for path in &files {
        let batch = read_fragment(path).map_err(|reason| FeedError::FeedLoad {
            feed: feed.clone(),
            reason,
        })?;
        debug!(path = %path.display(), rows = batch.num_rows(), "parsed fragment");

        let batch = match &schema {
            None => {
                schema = Some(batch.schema());
                batch
            }
            Some(expected) => align_columns(batch, expected).map_err(|reason| FeedError::FeedLoad {
                feed: feed.clone(),
                reason: format!("{}: {}", path.display(), reason),
            })?,
        };
        batches.push(batch);
    }

    // files is non-empty, so the first fragment set the schema
    let schema = schema.unwrap_or_else(|| Arc::new(Schema::empty()));
    let combined = concat_batches(&schema, &batches)?;
    let frame = Frame::new(feed, combined);

    match dedup_on {
        Some(subset) if !subset.is_empty() => frame.dedup(subset),
        _ => Ok(frame),
    }
}

/// Parse one CSV file into a batch of nullable Utf8 columns named by its header row.
fn read_fragment(path: &Path) -> std::result::Result<RecordBatch, String> {
    let data = fs::read(path).map_err(|e| format!("reading {}: {}", path.display(), e))?;

    let headers: Vec<String> = {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(Cursor::new(&data));
        rdr.headers()
            .map_err(|e| format!("reading header of {}: {}", path.display(), e))?
            .iter()
            .map(str::to_string)
            .collect()
    };
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(format!("{} has no header row", path.display()));
    }

    let fields: Vec<Field> = headers
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_ROWS)
        .build(Cursor::new(data))
        .map_err(|e| format!("creating CSV reader for {}: {}", path.display(), e))?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, ArrowError>>()
        .map_err(|e| format!("parsing {}: {}", path.display(), e))?;

    concat_batches(&schema, &batches).map_err(|e| format!("combining {}: {}", path.display(), e))
}

/// Reorder `batch` to the column order of `expected`.
///
/// Fragments of one feed may list the same columns in a different order; any
/// other difference in the header is an error.
fn align_columns(batch: RecordBatch, expected: &Schema) -> std::result::Result<RecordBatch, String> {
    let found = batch.schema();
    let mut want = column_names(expected);
    let mut have = column_names(&found);
    want.sort_unstable();
    have.sort_unstable();
    if want != have {
        return Err(format!(
            "has columns {:?}, expected {:?}",
            column_names(&found),
            column_names(expected)
        ));
    }
    if column_names(expected) == column_names(&found) {
        return Ok(batch);
    }

    let indices = expected
        .fields()
        .iter()
        .map(|f| found.index_of(f.name()))
        .collect::<std::result::Result<Vec<_>, ArrowError>>()
        .map_err(|e| e.to_string())?;
    batch.project(&indices).map_err(|e| e.to_string())
}

fn column_names(schema: &Schema) -> Vec<&str> {
    schema.fields().iter().map(|f| f.name().as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn concatenates_fragments_in_discovery_order() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("AccountFeed_V1");
        write(&dir, "part-0.csv", "account_id,name\n1,ann\n2,bo\n");
        write(&dir, "part-1.csv", "account_id,name\n3,cy\n");
        write(&dir, "sub/part-2.csv", "account_id,name\n1,ann\n");

        let frame = load_table(&dir, None).unwrap();
        assert_eq!(frame.name(), "AccountFeed_V1");
        assert_eq!(frame.num_rows(), 4);
        assert_eq!(
            frame.column_strings("account_id").unwrap(),
            vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("3".to_string()),
                Some("1".to_string())
            ]
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("feed");
        write(&dir, "a.csv", "id,v\n1,first\n2,x\n");
        write(&dir, "b.csv", "id,v\n1,second\n");

        let frame = load_table(&dir, Some(&["id"])).unwrap();
        assert_eq!(frame.num_rows(), 2);
        assert_eq!(
            frame.column_strings("v").unwrap(),
            vec![Some("first".to_string()), Some("x".to_string())]
        );
    }

    #[test]
    fn empty_cells_are_null_and_quotes_are_honoured() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("feed");
        write(&dir, "a.csv", "id,street\n1,\"1 Main St, Apt 2\"\n2,\n");

        let frame = load_table(&dir, None).unwrap();
        assert_eq!(
            frame.column_strings("street").unwrap(),
            vec![Some("1 Main St, Apt 2".to_string()), None]
        );
    }

    #[test]
    fn empty_directory_is_a_load_error() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("OfferFeed_V1");
        fs::create_dir_all(&dir).unwrap();
        let err = load_table(&dir, None).unwrap_err();
        assert!(matches!(err, FeedError::FeedLoad { ref feed, .. } if feed == "OfferFeed_V1"));
    }

    #[test]
    fn mismatched_headers_fail() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("feed");
        write(&dir, "a.csv", "id,v\n1,a\n");
        write(&dir, "b.csv", "id,w\n2,b\n");
        assert!(matches!(
            load_table(&dir, None),
            Err(FeedError::FeedLoad { .. })
        ));
    }

    #[test]
    fn reordered_columns_are_aligned_to_the_first_fragment() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("feed");
        write(&dir, "a.csv", "id,v\n1,a\n");
        write(&dir, "b.csv", "v,id\nb,2\n");

        let frame = load_table(&dir, None).unwrap();
        assert_eq!(frame.column_names(), vec!["id", "v"]);
        assert_eq!(
            frame.column_strings("id").unwrap(),
            vec![Some("1".to_string()), Some("2".to_string())]
        );
        assert_eq!(
            frame.column_strings("v").unwrap(),
            vec![Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn header_only_fragment_contributes_no_rows() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("feed");
        write(&dir, "a.csv", "id,v\n");
        write(&dir, "b.csv", "id,v\n7,z\n");
        let frame = load_table(&dir, None).unwrap();
        assert_eq!(frame.num_rows(), 1);
    }
}
