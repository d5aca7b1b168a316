// BSD 3-Clause License
//
// Copyright (c) 2025, Propval Contributors
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use crate::data::{PropertyType, Sale};
use crate::errors::WindowError;
use crate::spatial::{filter_sales, BoundingBox, DateRange};

/// Parameters of the adaptive window search.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Minimum number of matching rows the window must capture.
    pub threshold: usize,
    /// Height of the starting box in degrees of latitude.
    pub initial_height: f64,
    /// Width of the starting box in degrees of longitude.
    pub initial_width: f64,
    /// Upper bound on doubling steps before the search gives up. Sparse or
    /// heavily type-filtered data can never reach the threshold; without
    /// this cap the search would loop forever.
    pub max_expansions: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            threshold: 10_000,
            initial_height: 0.01,
            initial_width: 0.01,
            max_expansions: 32,
        }
    }
}

/// Grows a box centered on the query point, doubling both dimensions each
/// step and recentering, until the filtered subset reaches the row
/// threshold. Returns the final box only; callers re-filter against it to
/// obtain the subset.
pub fn expand_to_threshold(
    sales: &[Sale],
    latitude: f64,
    longitude: f64,
    period: &DateRange,
    kind: PropertyType,
    config: &WindowConfig,
) -> Result<BoundingBox, WindowError> {
    let mut height = config.initial_height;
    let mut width = config.initial_width;
    let mut area = BoundingBox::centered(latitude, longitude, height, width)?;
    let mut matched = filter_sales(sales, &area, period, kind).len();
    let mut expansions = 0u32;

    while matched < config.threshold {
        if expansions >= config.max_expansions {
            return Err(WindowError::MaxExpansionExceeded {
                limit: config.max_expansions,
                threshold: config.threshold,
                rows_found: matched,
                height,
                width,
            });
        }
        height *= 2.0;
        width *= 2.0;
        area = BoundingBox::centered(latitude, longitude, height, width)?;
        matched = filter_sales(sales, &area, period, kind).len();
        expansions += 1;
        log::debug!(
            "window expansion {}: {:.4} x {:.4} deg, {} of {} rows",
            expansions,
            height,
            width,
            matched,
            config.threshold
        );
    }
    Ok(area)
}
