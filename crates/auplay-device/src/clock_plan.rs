//! DAC 时钟树参数推导.
//!
//! 适用于 TLV320DAC3100 一类芯片的时钟树:
//!
//! ```text
//! MCLK ─► [PLL: ×R×J.D / P] ─► CODEC_CLK ─► ÷NDAC ─► DAC_CLK ─► ÷MDAC ─► DAC_MOD_CLK ─► ÷DOSR ─► fs
//! ```
//!
//! 约束:
//! - `P ∈ 1..=8`, `R ∈ 1..=4`, `J ∈ 4..=63`, `D ∈ 0..=9999`
//! - `D ≠ 0` 时 `R = 1`, `J ≤ 11`, 且 `MCLK/P ∈ [10, 20] MHz`; 否则 `MCLK/P ∈ [0.512, 20] MHz`
//! - `PLL_CLK ∈ [80, 110] MHz`
//! - `NDAC, MDAC ∈ 1..=128`, `DAC_CLK ≤ 49.152 MHz`, `DAC_MOD_CLK ≤ 6.758 MHz`
//! - `DOSR` 为 8 的倍数, `MDAC × DOSR ≥ 256`
//!
//! 全部计算使用整数, 推导出的方案精确复现目标采样率.

use std::fmt;

use auplay_core::{AuError, AuResult};

const STEP: &str = "clocking";

const PLL_CLK_MIN: u64 = 80_000_000;
const PLL_CLK_MAX: u64 = 110_000_000;
const PLL_IN_MIN: u64 = 512_000;
const PLL_IN_MIN_FRACTIONAL: u64 = 10_000_000;
const PLL_IN_MAX: u64 = 20_000_000;
const DAC_CLK_MAX: u64 = 49_152_000;
const DAC_MOD_CLK_MAX: u64 = 6_758_000;
const DIVIDER_MAX: u64 = 128;
const MIN_MDAC_DOSR: u64 = 256;
/// J.D 中 D 的精度 (4 位小数)
const D_SCALE: u64 = 10_000;

/// 候选过采样率, 从高到低尝试
const DOSR_CANDIDATES: [u32; 6] = [768, 512, 384, 256, 128, 64];

/// PLL 参数: `PLL_CLK = MCLK × R × J.D / P`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllParams {
    pub p: u32,
    pub r: u32,
    pub j: u32,
    pub d: u32,
}

impl PllParams {
    /// 由输入时钟计算输出频率, 不能整除时返回 `None`
    pub fn output_hz(&self, master_clock_hz: u32) -> Option<u64> {
        let jd = u64::from(self.j) * D_SCALE + u64::from(self.d);
        let num = u64::from(master_clock_hz) * u64::from(self.r) * jd;
        let den = u64::from(self.p) * D_SCALE;
        (num % den == 0).then_some(num / den)
    }
}

/// 一组完整的时钟参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockPlan {
    /// 目标采样率 (Hz)
    pub sample_rate: u32,
    /// 主时钟频率 (Hz)
    pub master_clock_hz: u32,
    /// `None` 表示 MCLK 直接作为 CODEC_CLK
    pub pll: Option<PllParams>,
    pub ndac: u32,
    pub mdac: u32,
    pub dosr: u32,
    /// CODEC_CLK 频率 (Hz)
    pub codec_clock_hz: u32,
}

impl ClockPlan {
    /// 为 `(sample_rate, master_clock_hz)` 推导时钟参数
    ///
    /// 优先不用 PLL; 需要 PLL 时选择最高可用的 DOSR 和最低的 PLL 频率.
    pub fn derive(sample_rate: u32, master_clock_hz: u32) -> AuResult<Self> {
        if sample_rate == 0 || master_clock_hz == 0 {
            return Err(AuError::device(
                STEP,
                format!(
                    "采样率与主时钟必须非零: sample_rate={}, master_clock_hz={}",
                    sample_rate, master_clock_hz
                ),
            ));
        }
        let fs = u64::from(sample_rate);
        let mclk = u64::from(master_clock_hz);

        let usable_dosr = || {
            DOSR_CANDIDATES
                .iter()
                .map(|&d| u64::from(d))
                .filter(move |&d| fs * d <= DAC_MOD_CLK_MAX)
        };

        // 直连: MCLK 恰好是 fs × DOSR 的整数倍
        for dosr in usable_dosr() {
            let mod_clk = fs * dosr;
            if mclk % mod_clk != 0 {
                continue;
            }
            if let Some((ndac, mdac)) = split_dividers(mclk, mclk / mod_clk, dosr) {
                return Ok(Self::assemble(
                    sample_rate,
                    master_clock_hz,
                    None,
                    ndac,
                    mdac,
                    dosr,
                    mclk,
                ));
            }
        }

        // 经 PLL: 在 [80, 110] MHz 内寻找 fs × DOSR 的整数倍
        for dosr in usable_dosr() {
            let mod_clk = fs * dosr;
            let first = PLL_CLK_MIN.div_ceil(mod_clk);
            let last = PLL_CLK_MAX / mod_clk;
            for product in first..=last {
                let pll_clk = mod_clk * product;
                let Some((ndac, mdac)) = split_dividers(pll_clk, product, dosr) else {
                    continue;
                };
                if let Some(pll) = find_pll(mclk, pll_clk) {
                    return Ok(Self::assemble(
                        sample_rate,
                        master_clock_hz,
                        Some(pll),
                        ndac,
                        mdac,
                        dosr,
                        pll_clk,
                    ));
                }
            }
        }

        Err(AuError::device(
            STEP,
            format!(
                "无法由 {} Hz 主时钟精确得到 {} Hz 采样率",
                master_clock_hz, sample_rate
            ),
        ))
    }

    fn assemble(
        sample_rate: u32,
        master_clock_hz: u32,
        pll: Option<PllParams>,
        ndac: u64,
        mdac: u64,
        dosr: u64,
        codec_clock_hz: u64,
    ) -> Self {
        // 各项均已受上限约束, 不会截断
        Self {
            sample_rate,
            master_clock_hz,
            pll,
            ndac: ndac as u32,
            mdac: mdac as u32,
            dosr: dosr as u32,
            codec_clock_hz: codec_clock_hz as u32,
        }
    }

    /// 是否启用 PLL
    pub fn uses_pll(&self) -> bool {
        self.pll.is_some()
    }

    /// DAC_CLK = CODEC_CLK / NDAC
    pub fn dac_clock_hz(&self) -> u64 {
        u64::from(self.codec_clock_hz) / u64::from(self.ndac)
    }

    /// DAC_MOD_CLK = fs × DOSR
    pub fn dac_mod_clock_hz(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.dosr)
    }

    /// 逐项检查时钟树约束, 并确认能精确复现采样率
    pub fn validate(&self) -> AuResult<()> {
        let fail = |reason: String| Err(AuError::device(STEP, reason));
        let (ndac, mdac, dosr) = (
            u64::from(self.ndac),
            u64::from(self.mdac),
            u64::from(self.dosr),
        );

        if !(1..=DIVIDER_MAX).contains(&ndac) || !(1..=DIVIDER_MAX).contains(&mdac) {
            return fail(format!("分频器越界: NDAC={}, MDAC={}", self.ndac, self.mdac));
        }
        if dosr == 0 || dosr % 8 != 0 || mdac * dosr < MIN_MDAC_DOSR {
            return fail(format!("DOSR 无效: DOSR={}, MDAC={}", self.dosr, self.mdac));
        }
        let codec_clk = u64::from(self.codec_clock_hz);
        if codec_clk > DAC_CLK_MAX * ndac {
            return fail(format!("DAC_CLK 超过上限: {} Hz", self.dac_clock_hz()));
        }
        if self.dac_mod_clock_hz() > DAC_MOD_CLK_MAX {
            return fail(format!(
                "DAC_MOD_CLK 超过上限: {} Hz",
                self.dac_mod_clock_hz()
            ));
        }
        if codec_clk != u64::from(self.sample_rate) * ndac * mdac * dosr {
            return fail(format!(
                "CODEC_CLK={} Hz 不能精确得到 {} Hz",
                codec_clk, self.sample_rate
            ));
        }

        match self.pll {
            None => {
                if codec_clk != u64::from(self.master_clock_hz) {
                    return fail("未启用 PLL 时 CODEC_CLK 必须等于 MCLK".into());
                }
            }
            Some(pll) => {
                if !pll_params_valid(u64::from(self.master_clock_hz), &pll) {
                    return fail(format!("PLL 参数越界: {:?}", pll));
                }
                if pll.output_hz(self.master_clock_hz) != Some(codec_clk) {
                    return fail(format!("PLL 输出与 CODEC_CLK={} Hz 不符", codec_clk));
                }
                if !(PLL_CLK_MIN..=PLL_CLK_MAX).contains(&codec_clk) {
                    return fail(format!("PLL_CLK 越界: {} Hz", codec_clk));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ClockPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pll {
            Some(pll) => write!(
                f,
                "PLL {:.3} MHz (P={} R={} J={} D={:04})",
                f64::from(self.codec_clock_hz) / 1e6,
                pll.p,
                pll.r,
                pll.j,
                pll.d
            )?,
            None => write!(
                f,
                "MCLK 直连 {:.3} MHz",
                f64::from(self.codec_clock_hz) / 1e6
            )?,
        }
        write!(
            f,
            ", NDAC={} MDAC={} DOSR={} → {} Hz",
            self.ndac, self.mdac, self.dosr, self.sample_rate
        )
    }
}

/// 把 `product = NDAC × MDAC` 拆成满足约束的两个分频器, NDAC 取最小可行值
fn split_dividers(codec_clk: u64, product: u64, dosr: u64) -> Option<(u64, u64)> {
    (1..=DIVIDER_MAX)
        .filter(|ndac| product % ndac == 0)
        .map(|ndac| (ndac, product / ndac))
        .find(|&(ndac, mdac)| {
            mdac <= DIVIDER_MAX && codec_clk <= DAC_CLK_MAX * ndac && mdac * dosr >= MIN_MDAC_DOSR
        })
}

/// 寻找使 `MCLK × R × J.D / P == pll_clk` 精确成立的 PLL 参数
fn find_pll(mclk: u64, pll_clk: u64) -> Option<PllParams> {
    for p in 1..=8u64 {
        for r in 1..=4u64 {
            let num = pll_clk * p * D_SCALE;
            let den = mclk * r;
            if num % den != 0 {
                continue;
            }
            let jd = num / den;
            let pll = PllParams {
                p: p as u32,
                r: r as u32,
                j: (jd / D_SCALE).min(u64::from(u32::MAX)) as u32,
                d: (jd % D_SCALE) as u32,
            };
            if pll_params_valid(mclk, &pll) {
                return Some(pll);
            }
        }
    }
    None
}

fn pll_params_valid(mclk: u64, pll: &PllParams) -> bool {
    let p = u64::from(pll.p);
    if !(1..=8).contains(&pll.p) || !(1..=4).contains(&pll.r) || pll.d >= D_SCALE as u32 {
        return false;
    }
    if pll.d == 0 {
        (4..=63).contains(&pll.j) && mclk >= PLL_IN_MIN * p && mclk <= PLL_IN_MAX * p
    } else {
        pll.r == 1
            && (4..=11).contains(&pll.j)
            && mclk >= PLL_IN_MIN_FRACTIONAL * p
            && mclk <= PLL_IN_MAX * p
    }
}
