//! Loading tables from Parquet.
use arrow::{array::RecordBatch, compute::concat_batches};
use futures_util::TryStreamExt;
use parquet::{
    arrow::{
        ParquetRecordBatchStreamBuilder, arrow_reader::ParquetRecordBatchReaderBuilder,
        async_reader::AsyncFileReader,
    },
    file::reader::ChunkReader,
};

use crate::{
    error::Result,
    observability::log_debug,
    table::Table,
};

impl Table {
    /// Read a whole Parquet file into a table, numbering rows from zero.
    ///
    /// # Example
    /// ```no_run
    /// use std::fs::File;
    ///
    /// use rowselect::Table;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let table = Table::read_parquet(File::open("iris.parquet")?)?;
    /// println!("{} rows", table.num_rows());
    /// # Ok(())
    /// # }
    /// ```
    pub fn read_parquet<R: ChunkReader + 'static>(reader: R) -> Result<Table> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
        let schema = builder.schema().clone();
        let batches = builder.build()?.collect::<Result<Vec<RecordBatch>, _>>()?;
        let batch = concat_batches(&schema, &batches)?;
        log_debug!(
            component = "io",
            event = "parquet_loaded",
            batches = batches.len(),
            rows = batch.num_rows(),
        );
        Table::new(batch)
    }

    /// Read a whole Parquet file through an async reader.
    pub async fn read_parquet_async<R>(reader: R) -> Result<Table>
    where
        R: AsyncFileReader + Unpin + Send + 'static,
    {
        let builder = ParquetRecordBatchStreamBuilder::new(reader).await?;
        let schema = builder.schema().clone();
        let batches: Vec<RecordBatch> = builder.build()?.try_collect().await?;
        let batch = concat_batches(&schema, &batches)?;
        log_debug!(
            component = "io",
            event = "parquet_loaded",
            batches = batches.len(),
            rows = batch.num_rows(),
        );
        Table::new(batch)
    }

    /// Open and read a Parquet file from disk.
    #[cfg(feature = "tokio")]
    pub async fn open_parquet(path: impl AsRef<std::path::Path>) -> Result<Table> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| parquet::errors::ParquetError::External(Box::new(e)))?;
        Table::read_parquet_async(file).await
    }
}
