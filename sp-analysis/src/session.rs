//! Per-analysis context and diagnostics.
//!
//! One [`AnalysisContext`] per request; nothing here outlives the request.
//! [`Diagnostics`] carries the raw reply and repair provenance so a degraded
//! run can be written to a debug sidecar instead of silently passing.

use crate::repair::RepairStage;

/// Bundled stored procedure used when no file is supplied.
pub const SAMPLE_SQL: &str = r#"CREATE PROCEDURE usp_GetCustomerOrders
@CustomerId INT
AS
BEGIN
    SET NOCOUNT ON;

    -- Create temp table to store order data
    CREATE TABLE #TempOrders (
        OrderId INT,
        OrderDate DATETIME,
        OrderAmount DECIMAL(18,2)
    )

    -- Insert data into temp table
    INSERT INTO #TempOrders
    SELECT
        OrderId,
        OrderDate,
        OrderAmount
    FROM Orders
    WHERE CustomerId = @CustomerId

    -- Cursor to process orders
    DECLARE @OrderId INT
    DECLARE @OrderDate DATETIME

    DECLARE order_cursor CURSOR FOR
    SELECT OrderId, OrderDate FROM #TempOrders

    OPEN order_cursor
    FETCH NEXT FROM order_cursor INTO @OrderId, @OrderDate

    WHILE @@FETCH_STATUS = 0
    BEGIN
        -- Update order status
        UPDATE Orders SET Status = 'Processed' WHERE OrderId = @OrderId
        UPDATE Orders SET LastModified = GETDATE() WHERE OrderId = @OrderId

        -- Process order details
        UPDATE OrderDetails
        SET Processed = 1
        WHERE OrderId = @OrderId

        FETCH NEXT FROM order_cursor INTO @OrderId, @OrderDate
    END

    CLOSE order_cursor
    DEALLOCATE order_cursor

    -- Return results
    SELECT
        c.CustomerName,
        o.OrderId,
        o.OrderDate,
        o.OrderAmount,
        (SELECT COUNT(*) FROM OrderDetails WHERE OrderId = o.OrderId) AS ItemCount
    FROM
        Customers c
        INNER JOIN Orders o ON c.CustomerId = o.CustomerId
    WHERE
        c.CustomerId = @CustomerId

    -- Cleanup
    DROP TABLE #TempOrders
END
"#;

/// Where the SQL under analysis came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlSource {
    /// User-supplied file, keyed by its display name.
    Upload { name: String },
    /// The bundled sample procedure.
    Sample,
}

/// One analysis request: the SQL and its provenance.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub source: SqlSource,
    pub sql: String,
}

impl AnalysisContext {
    /// Context for an uploaded file.
    pub fn from_upload(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            source: SqlSource::Upload { name: name.into() },
            sql: sql.into(),
        }
    }

    /// Context over the bundled sample procedure.
    pub fn sample() -> Self {
        Self {
            source: SqlSource::Sample,
            sql: SAMPLE_SQL.to_string(),
        }
    }
}

/// Repair provenance for one completed analysis.
#[derive(Debug)]
pub struct Diagnostics {
    /// Model reply before normalization.
    pub raw_response: String,
    /// Stage that finally produced the record.
    pub repair_stage: RepairStage,
    /// Errors from the stages that ran and failed, in order.
    pub stage_errors: Vec<String>,
}

impl Diagnostics {
    /// True when the reply needed any repair past the strict parse.
    pub fn is_degraded(&self) -> bool {
        self.repair_stage.is_degraded()
    }

    /// Plain-text body for the debug sidecar file.
    pub fn render_debug(&self) -> String {
        let mut out = String::with_capacity(self.raw_response.len() + 256);
        out.push_str(&format!("repair stage: {}\n\n", self.repair_stage.label()));
        out.push_str("stage errors:\n");
        if self.stage_errors.is_empty() {
            out.push_str("  (none)\n");
        } else {
            for error in &self.stage_errors {
                out.push_str(&format!("  - {error}\n"));
            }
        }
        out.push_str("\nraw response:\n");
        out.push_str(&self.raw_response);
        if !self.raw_response.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}
