//! LanceDB-backed vector index.
//!
//! The index is a table with an `id` column holding the catalog position
//! and a fixed-size float32 `vector` column. It is built offline and only
//! opened and searched here.

use crate::vector_index::{sort_neighbors, Neighbor, VectorIndex};
use arrow_array::{Array, Float32Array, Int64Array, RecordBatch};
use arrow_schema::{DataType, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};
use std::path::Path;
use yojana_core::{AppError, AppResult};

/// Default table name inside the index database.
pub const DEFAULT_TABLE: &str = "schemes";

pub const ID_COLUMN: &str = "id";
pub const VECTOR_COLUMN: &str = "vector";

/// Column LanceDB adds to nearest-neighbor results.
const DISTANCE_COLUMN: &str = "_distance";

/// Read-only LanceDB table searched by exact L2 distance.
pub struct LanceDbIndex {
    table: Table,
    dimension: usize,
    count: usize,
}

impl LanceDbIndex {
    /// Open an existing index table.
    ///
    /// # Arguments
    /// * `db_path` - Directory of the LanceDB database
    /// * `table_name` - Table holding the scheme vectors
    pub async fn open(db_path: &Path, table_name: &str) -> AppResult<Self> {
        // Connecting to a missing path would create an empty database
        if !db_path.exists() {
            return Err(AppError::Knowledge(format!(
                "Vector index not found at {:?}",
                db_path
            )));
        }

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to connect to LanceDB: {}", e)))?;

        let table = conn.open_table(table_name).execute().await.map_err(|e| {
            AppError::Knowledge(format!("Failed to open index table '{}': {}", table_name, e))
        })?;

        let schema = table
            .schema()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to read index schema: {}", e)))?;
        let dimension = vector_dimension(&schema)?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to count index rows: {}", e)))?;

        tracing::info!(
            vectors = count,
            dimension,
            table = table_name,
            "Opened LanceDB vector index at {:?}",
            db_path
        );

        Ok(Self {
            table,
            dimension,
            count,
        })
    }
}

/// Check the table layout and return the vector dimension.
fn vector_dimension(schema: &Schema) -> AppResult<usize> {
    let id = schema.field_with_name(ID_COLUMN).map_err(|_| {
        AppError::Knowledge(format!("Index table has no '{}' column", ID_COLUMN))
    })?;
    if id.data_type() != &DataType::Int64 {
        return Err(AppError::Knowledge(format!(
            "Column '{}' must be int64, found {:?}",
            ID_COLUMN,
            id.data_type()
        )));
    }

    let vector = schema.field_with_name(VECTOR_COLUMN).map_err(|_| {
        AppError::Knowledge(format!("Index table has no '{}' column", VECTOR_COLUMN))
    })?;
    match vector.data_type() {
        DataType::FixedSizeList(item, size)
            if *size > 0 && item.data_type() == &DataType::Float32 =>
        {
            Ok(*size as usize)
        }
        other => Err(AppError::Knowledge(format!(
            "Column '{}' must be a fixed-size float32 list, found {:?}",
            VECTOR_COLUMN, other
        ))),
    }
}

/// Pull `(id, distance)` pairs out of one result batch.
fn batch_neighbors(batch: &RecordBatch) -> AppResult<Vec<Neighbor>> {
    let ids = batch
        .column_by_name(ID_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| AppError::Knowledge("Search result has no id column".to_string()))?;
    let distances = batch
        .column_by_name(DISTANCE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| AppError::Knowledge("Search result has no distance column".to_string()))?;

    Ok((0..batch.num_rows())
        .filter(|row| ids.is_valid(*row))
        .map(|row| Neighbor::new(ids.value(row), distances.value(row)))
        .collect())
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.count
    }

    async fn search(&self, query: &[f32], count: usize) -> AppResult<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(AppError::Embedding(format!(
                "Query vector has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        if count == 0 || self.count == 0 {
            return Ok(Vec::new());
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(query.to_vec())
            .map_err(|e| AppError::Knowledge(format!("Failed to create query: {}", e)))?
            .column(VECTOR_COLUMN)
            .distance_type(DistanceType::L2)
            .select(Select::columns(&[ID_COLUMN]))
            .limit(count)
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to collect results: {}", e)))?;

        let mut neighbors = Vec::with_capacity(count);
        for batch in &batches {
            neighbors.extend(batch_neighbors(batch)?);
        }

        sort_neighbors(&mut neighbors);
        neighbors.truncate(count);

        tracing::debug!(hits = neighbors.len(), "LanceDB search complete");

        Ok(neighbors)
    }
}

/// Write `vectors` as an index table, vector `i` getting id `i`.
#[cfg(test)]
pub(crate) async fn write_table(
    db_path: &Path,
    table_name: &str,
    vectors: &[Vec<f32>],
) -> AppResult<()> {
    use arrow_array::{ArrayRef, FixedSizeListArray, RecordBatchIterator};
    use arrow_schema::Field;
    use std::sync::Arc;

    let dimension = vectors.first().map(|v| v.len()).unwrap_or(1);
    let item = Arc::new(Field::new("item", DataType::Float32, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::Int64, false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(item.clone(), dimension as i32),
            false,
        ),
    ]));

    let ids = Int64Array::from_iter_values(0..vectors.len() as i64);
    let values = Float32Array::from(vectors.concat());
    let list = FixedSizeListArray::try_new(item, dimension as i32, Arc::new(values), None)
        .map_err(|e| AppError::Knowledge(e.to_string()))?;
    let columns = vec![Arc::new(ids) as ArrayRef, Arc::new(list) as ArrayRef];
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| AppError::Knowledge(e.to_string()))?;

    let conn = lancedb::connect(&db_path.to_string_lossy())
        .execute()
        .await
        .map_err(|e| AppError::Knowledge(e.to_string()))?;
    conn.create_table(table_name, RecordBatchIterator::new(vec![Ok(batch)], schema))
        .execute()
        .await
        .map_err(|e| AppError::Knowledge(e.to_string()))?;

    Ok(())
}
