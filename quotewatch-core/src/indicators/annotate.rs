//! Series annotated with SMA and RSI columns.

use super::{Indicator, IndicatorParams, ParamsError, Rsi, Sma};
use crate::domain::{PricePoint, TimeSeries};
use serde::Serialize;

/// RSI level at or above which the latest reading counts as overbought.
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI level at or below which the latest reading counts as oversold.
pub const RSI_OVERSOLD: f64 = 30.0;

/// A `TimeSeries` plus derived columns aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedSeries {
    series: TimeSeries,
    params: IndicatorParams,
    sma_short: Vec<Option<f64>>,
    sma_long: Vec<Option<f64>>,
    rsi: Vec<Option<f64>>,
}

/// One row of the annotated table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnotatedRow {
    #[serde(flatten)]
    pub point: PricePoint,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
}

/// Compute both SMAs and the RSI over `series`.
///
/// Fails with `ParamsError` if any window is zero.
pub fn annotate(
    series: TimeSeries,
    params: &IndicatorParams,
) -> Result<AnnotatedSeries, ParamsError> {
    params.validate()?;
    let points = series.points();
    let sma_short = Sma::new(params.sma_short_window).compute(points);
    let sma_long = Sma::new(params.sma_long_window).compute(points);
    let rsi = Rsi::new(params.rsi_window).compute(points);
    Ok(AnnotatedSeries {
        series,
        params: *params,
        sma_short,
        sma_long,
        rsi,
    })
}

impl AnnotatedSeries {
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn sma_short(&self) -> &[Option<f64>] {
        &self.sma_short
    }

    pub fn sma_long(&self) -> &[Option<f64>] {
        &self.sma_long
    }

    pub fn rsi(&self) -> &[Option<f64>] {
        &self.rsi
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<AnnotatedRow> {
        let point = *self.series.points().get(index)?;
        Some(AnnotatedRow {
            point,
            sma_short: self.sma_short[index],
            sma_long: self.sma_long[index],
            rsi: self.rsi[index],
        })
    }

    /// Rows oldest-first.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = AnnotatedRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    pub fn latest(&self) -> Option<AnnotatedRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// Zone of the most recent RSI reading, if the last point has one.
    pub fn rsi_zone(&self) -> Option<RsiZone> {
        self.latest().and_then(|r| r.rsi).map(RsiZone::classify)
    }

    /// Short-vs-long SMA relation at the last point.
    pub fn sma_trend(&self) -> SmaTrend {
        match self.latest() {
            Some(AnnotatedRow {
                sma_short: Some(short),
                sma_long: Some(long),
                ..
            }) => SmaTrend::classify(short, long),
            _ => SmaTrend::Undetermined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi >= RSI_OVERBOUGHT {
            RsiZone::Overbought
        } else if rsi <= RSI_OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RsiZone::Overbought => "overbought",
            RsiZone::Neutral => "neutral",
            RsiZone::Oversold => "oversold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SmaTrend {
    /// Short SMA above long SMA.
    Bullish,
    /// Short SMA at or below long SMA.
    Bearish,
    Undetermined,
}

impl SmaTrend {
    pub fn classify(short: f64, long: f64) -> Self {
        if short > long {
            SmaTrend::Bullish
        } else {
            SmaTrend::Bearish
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SmaTrend::Bullish => "short above long",
            SmaTrend::Bearish => "short at or below long",
            SmaTrend::Undetermined => "not enough data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Interval, Symbol};
    use crate::indicators::make_points;

    fn series(closes: &[f64]) -> TimeSeries {
        TimeSeries::new(
            Symbol::new("TEST").unwrap(),
            Interval::FiveMinutes,
            make_points(closes),
        )
        .unwrap()
    }

    #[test]
    fn columns_align_with_points() {
        let params = IndicatorParams::new(2, 3, 2).unwrap();
        let a = annotate(series(&[1.0, 2.0, 3.0, 4.0]), &params).unwrap();

        assert_eq!(a.len(), 4);
        assert_eq!(a.sma_short(), &[None, Some(1.5), Some(2.5), Some(3.5)]);
        assert_eq!(a.sma_long(), &[None, None, Some(2.0), Some(3.0)]);
        assert_eq!(a.rsi()[3], Some(100.0));

        let row = a.latest().unwrap();
        assert_eq!(row.point.close, 4.0);
        assert_eq!(row.sma_short, Some(3.5));
        assert_eq!(a.rows().count(), 4);
        assert_eq!(a.rows().next_back().unwrap(), row);
    }

    #[test]
    fn labels_for_latest_row() {
        let params = IndicatorParams::new(2, 3, 2).unwrap();
        let rising = annotate(series(&[1.0, 2.0, 3.0, 4.0]), &params).unwrap();
        assert_eq!(rising.rsi_zone(), Some(RsiZone::Overbought));
        assert_eq!(rising.sma_trend(), SmaTrend::Bullish);

        let falling = annotate(series(&[4.0, 3.0, 2.0, 1.0]), &params).unwrap();
        assert_eq!(falling.rsi_zone(), Some(RsiZone::Oversold));
        assert_eq!(falling.sma_trend(), SmaTrend::Bearish);
    }

    #[test]
    fn labels_without_data() {
        let params = IndicatorParams::default();
        let short = annotate(series(&[1.0, 2.0]), &params).unwrap();
        assert_eq!(short.rsi_zone(), None);
        assert_eq!(short.sma_trend(), SmaTrend::Undetermined);
    }

    #[test]
    fn zero_window_is_an_error() {
        let params = IndicatorParams {
            sma_long_window: 0,
            ..IndicatorParams::default()
        };
        let err = annotate(series(&[1.0, 2.0, 3.0]), &params).unwrap_err();
        assert_eq!(
            err,
            ParamsError::ZeroWindow {
                name: "sma_long_window",
                value: 0
            }
        );
    }

    #[test]
    fn zone_thresholds_are_inclusive() {
        assert_eq!(RsiZone::classify(70.0), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(30.0), RsiZone::Oversold);
        assert_eq!(RsiZone::classify(50.0), RsiZone::Neutral);
    }
}
