//! ビームサーチによるデコード
//!
//! 全ての辺を主スコアラーと補助スコアラーで採点し、重み付き和で各ノードの
//! 上位K個の部分パス（ビーム）を境界の順に埋めていきます。

use crate::analysis::extra_nodes::ExtraNodesContext;
use crate::analysis::features::FeatureComputer;
use crate::analysis::lattice::{BeamRef, ConnectionBeamElement, ConnectionPtr, Lattice};
use crate::analysis::score_api::ScorerDef;
use crate::errors::{MorphError, Result};
use crate::utils::ConstSliceable;

/// ビームサーチのデコーダ
///
/// 作業領域を保持し、解析をまたいで再利用します。
#[derive(Default)]
pub struct BeamDecoder {
    rows: Vec<u32>,
    scores: Vec<f32>,
    candidates: Vec<ConnectionBeamElement>,
    beams: Vec<ConnectionBeamElement>,
}

impl BeamDecoder {
    /// ラティスを採点し、ビームを埋めます。
    ///
    /// # エラー
    ///
    /// 重みの数がスコアラーの数と一致しない場合や、補助スコアラーが失敗した場合に
    /// [`MorphError`]を返します。
    pub fn decode(
        &mut self,
        lattice: &mut Lattice,
        xtra: &ExtraNodesContext,
        def: &ScorerDef,
        computer: &mut FeatureComputer,
    ) -> Result<()> {
        def.validate()?;
        lattice.set_num_scorers(def.num_scorers());
        self.score_primary(lattice, def, computer)?;
        for (i, factory) in def.others.iter().enumerate() {
            let mut instance = factory.make_instance()?;
            instance.score_lattice(lattice, xtra, i + 1)?;
        }
        self.fill_beams(lattice, &def.score_weights);
        Ok(())
    }

    /// 主スコアラーのスコアを書き込みます。スコアラー0番の位置に入ります。
    pub fn score_primary(
        &mut self,
        lattice: &mut Lattice,
        def: &ScorerDef,
        computer: &mut FeatureComputer,
    ) -> Result<()> {
        let num_weights = def.feature.weights().len();
        if !num_weights.is_power_of_two() {
            return Err(MorphError::invalid_parameter(
                "feature",
                format!("weight buffer length must be a power of two, got {num_weights}"),
            ));
        }
        let mask = (num_weights - 1) as u32;
        let row_size = computer.row_size();
        let num_scorers = lattice.num_scorers();

        for b in 1..lattice.created_boundary_count() {
            let bnd = lattice.boundary(b);
            let num_ends = bnd.ends().len();
            let num_edges = bnd.num_nodes() * num_ends;
            self.rows.clear();
            self.rows.resize(num_edges * row_size, 0);
            for r in 0..bnd.num_nodes() {
                let right = bnd.node_features(r);
                for (l, &end) in bnd.ends().iter().enumerate() {
                    let k = r * num_ends + l;
                    let out = &mut self.rows[k * row_size..(k + 1) * row_size];
                    computer.edge_row(lattice.node_features(end), right, mask, out);
                }
            }
            self.scores.clear();
            self.scores.resize(num_edges, 0.0);
            def.feature
                .compute(&mut self.scores, ConstSliceable::new(&self.rows, row_size));

            let bnd = lattice.boundary_mut(b);
            bnd.reset_scores(num_scorers);
            let out = bnd.scores_mut();
            for (k, &s) in self.scores.iter().enumerate() {
                out[k * num_scorers] = s;
            }
        }
        Ok(())
    }

    /// 採点済みのラティスのビームを埋めます。
    pub fn fill_beams(&mut self, lattice: &mut Lattice, weights: &[f32]) {
        let beam_size = lattice.beam_size();
        let num_scorers = lattice.num_scorers();

        let bos = lattice.boundary_mut(0);
        bos.reset_beams(beam_size);
        bos.beams_mut()[0] = ConnectionBeamElement {
            ptr: ConnectionPtr {
                boundary: 0,
                left: 0,
                right: 0,
                beam: 0,
                previous: None,
            },
            total_score: 0.0,
        };

        for b in 1..lattice.created_boundary_count() {
            let bnd = lattice.boundary(b);
            let num_ends = bnd.ends().len();
            self.beams.clear();
            for r in 0..bnd.num_nodes() {
                self.candidates.clear();
                for (l, &end) in bnd.ends().iter().enumerate() {
                    let base = (r * num_ends + l) * num_scorers;
                    let edge: f32 = bnd.scores()[base..base + num_scorers]
                        .iter()
                        .zip(weights)
                        .map(|(s, w)| s * w)
                        .sum();
                    for (k, el) in lattice.node_beam(end).iter().enumerate() {
                        if el.is_fake() {
                            break;
                        }
                        self.candidates.push(ConnectionBeamElement {
                            ptr: ConnectionPtr {
                                boundary: b as u32,
                                left: l as u32,
                                right: r as u32,
                                beam: k as u32,
                                previous: Some(BeamRef {
                                    boundary: end.boundary,
                                    slot: (end.node as usize * beam_size + k) as u32,
                                }),
                            },
                            total_score: el.total_score + edge,
                        });
                    }
                }
                self.candidates
                    .sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
                let taken = self.candidates.len().min(beam_size);
                self.beams.extend_from_slice(&self.candidates[..taken]);
                self.beams.extend(
                    std::iter::repeat_n(ConnectionBeamElement::fake(), beam_size - taken),
                );
            }
            let bnd = lattice.boundary_mut(b);
            bnd.reset_beams(beam_size);
            bnd.beams_mut().copy_from_slice(&self.beams);
        }
    }
}
