// SPDX-FileCopyrightText: © 2024 The aiert authors
// SPDX-License-Identifier: Apache-2.0

use std::io;

/// Given an array of performance-counter samples, print their mean and
/// population standard deviation. The output text is kept exactly as the
/// consuming scripts expect it, historical spelling included.
pub fn compute_stats<W: io::Write>(samples: &[u32], w: &mut W) -> io::Result<()> {
    if samples.is_empty() {
        return Ok(());
    }

    let total: u64 = samples.iter().map(|v| *v as u64).sum();
    let mean = total as f32 / samples.len() as f32;

    let mut sdev = 0.0f32;
    for sample in samples {
        let x = *sample as f32 - mean;
        sdev += x * x;
    }
    sdev = (sdev / samples.len() as f32).sqrt();

    writeln!(w, "Mean and Standard Devation: {mean:.6}, {sdev:.6} ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_sdev_of_a_small_sample() {
        let mut out = Vec::new();
        compute_stats(&[1, 2, 3], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Mean and Standard Devation: 2.000000, 0.816497 \n"
        );
    }

    #[test]
    fn constant_samples_have_zero_sdev() {
        let mut out = Vec::new();
        compute_stats(&[7, 7, 7, 7], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Mean and Standard Devation: 7.000000, 0.000000 \n"
        );
    }

    #[test]
    fn empty_input_prints_nothing() {
        let mut out = Vec::new();
        compute_stats(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }
}
